//! Errors raised while serving a request.
//!
//! None of these are fatal: the dispatcher logs them and still answers the
//! client where it can.

use devctl_core::DeviceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A query parameter is missing its value or is not an integer.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// The request filled the whole read buffer and may be cut short.
    #[error("Request truncated at {0} bytes")]
    TruncatedRead(usize),

    /// The sensor did not return a reading.
    #[error("Sensor unavailable")]
    SensorUnavailable,

    /// The peer went away while the response was being written.
    #[error("Failed to write response: {0}")]
    ResponseWriteFailure(#[source] std::io::Error),

    /// A collaborator failed while applying a command.
    #[error(transparent)]
    Device(#[from] DeviceError),
}
