//! # devctl-protocol
//!
//! The device control protocol: a small HTTP/1.1 subset spoken over a raw
//! socket.
//!
//! This crate defines how a request is classified into a [`Command`], how
//! responses are encoded, and the [`Dispatcher`] that ties both to the
//! device collaborators. It is runtime-agnostic; the tokio server and the
//! ESP32 firmware wrap it with their own accept loops.

pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod page;
pub mod request;
pub mod response;

pub use dispatcher::Dispatcher;
pub use error::ProtocolError;
pub use listener::bind_listener;
pub use request::{Command, QueryParams};
pub use response::{ContentType, Response, SensorSnapshot};

/// Default maximum number of bytes read from one request.
pub const DEFAULT_READ_LIMIT: usize = 1024;
