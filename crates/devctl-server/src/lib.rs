//! # devctl-server
//!
//! Device control server for Linux hosts.
//!
//! Wraps the runtime-agnostic [`Dispatcher`] in a tokio accept loop and
//! runs the sensor readout on a tokio interval.
//!
//! Enable features based on target platform:
//! - `tokio-runtime` (default) - For Linux/desktop
//!
//! The ESP32 firmware does not use this crate; it drives the same
//! dispatcher from a blocking `std::net` loop.

pub mod error;
#[cfg(feature = "tokio-runtime")]
pub mod poller;
#[cfg(feature = "tokio-runtime")]
pub mod server;

pub use devctl_protocol::Dispatcher;
pub use error::ServerError;
#[cfg(feature = "tokio-runtime")]
pub use poller::spawn_poller;
#[cfg(feature = "tokio-runtime")]
pub use server::{serve_connection, DeviceServer, ServerConfig};
