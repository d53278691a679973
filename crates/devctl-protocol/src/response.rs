//! HTTP responses.
//!
//! Every response is `200 OK` with exactly one `Content-Type` header and no
//! `Content-Length`. The connection is closed after the body, which is how
//! the client finds the end of it.

use devctl_core::{Alert, SensorReading};
use serde::{Deserialize, Serialize};

/// Status line sent for every response.
pub const STATUS_LINE: &str = "HTTP/1.1 200 OK";

/// Body type of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Json,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Html => "text/html",
            ContentType::Json => "application/json",
        }
    }
}

/// A response ready to be written to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub content_type: ContentType,
    pub body: String,
}

impl Response {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Html,
            body: body.into(),
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Json,
            body: body.into(),
        }
    }

    /// Status line, header, blank line and body as a single buffer.
    pub fn encode(&self) -> Vec<u8> {
        format!(
            "{}\r\nContent-Type: {}\r\n\r\n{}",
            STATUS_LINE,
            self.content_type.as_str(),
            self.body
        )
        .into_bytes()
    }
}

/// JSON body of a `/data` request.
///
/// Missing values serialize as `null` rather than being omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub alert: String,
}

impl SensorSnapshot {
    pub fn from_reading(reading: &SensorReading) -> Self {
        Self {
            temperature: reading.temperature,
            humidity: reading.humidity,
            alert: Alert::classify(reading.temperature, reading.humidity)
                .message()
                .to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
