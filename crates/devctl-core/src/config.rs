//! Server configuration.
//!
//! Settings are plain serde types shared across platforms:
//! - Linux: loaded from a JSON file
//! - ESP32: assembled from compile-time environment variables
//!
//! Every field has a default, so a partial document is valid.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file was not found.
    NotFound(String),
    /// Failed to read configuration.
    ReadError(String),
    /// Configuration data is invalid.
    InvalidData(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => write!(f, "Configuration not found: {}", path),
            ConfigError::ReadError(msg) => write!(f, "Read error: {}", msg),
            ConfigError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Configuration Types
// ============================================================================

/// Top-level server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Address to listen on.
    pub bind_addr: String,

    /// HTTP port.
    pub port: u16,

    /// Listen backlog.
    pub backlog: u32,

    /// Maximum bytes read from one request. Longer requests are truncated.
    pub read_limit: usize,

    /// Seconds between readout refreshes. `None` disables the poller.
    pub poll_interval_secs: Option<u64>,

    /// Station mode credentials.
    pub wifi: WifiSettings,

    /// Local access point, started alongside the station.
    pub access_point: Option<AccessPointSettings>,

    /// Cloud dashboard receiving readout values.
    pub dashboard: Option<DashboardSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 80,
            backlog: 5,
            read_limit: 1024,
            poll_interval_secs: Some(5),
            wifi: WifiSettings::default(),
            access_point: Some(AccessPointSettings::default()),
            dashboard: None,
        }
    }
}

/// Wi-Fi station credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WifiSettings {
    /// Network SSID.
    pub ssid: String,

    /// Network password (empty for open networks).
    pub password: String,
}

/// Access point credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessPointSettings {
    pub ssid: String,

    /// WPA2 passphrase, 8 to 63 characters. Empty for an open AP.
    pub password: String,
}

impl Default for AccessPointSettings {
    fn default() -> Self {
        Self {
            ssid: "ESP32-AP".to_string(),
            password: "12345678".to_string(),
        }
    }
}

/// Blynk dashboard connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    /// Device auth token.
    pub token: String,

    /// Dashboard host.
    #[serde(default = "default_dashboard_server")]
    pub server: String,
}

fn default_dashboard_server() -> String {
    "blynk.cloud".to_string()
}

impl Settings {
    /// Parse settings from a JSON document and validate them.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidData(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::ReadError(format!("{}: {}", path.display(), e)),
        })?;
        Self::from_json(&json)
    }

    /// Check values that would make the server unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidData("port must be non-zero".into()));
        }
        if self.backlog == 0 {
            return Err(ConfigError::InvalidData("backlog must be non-zero".into()));
        }
        if self.read_limit == 0 {
            return Err(ConfigError::InvalidData("readLimit must be non-zero".into()));
        }
        if self.poll_interval_secs == Some(0) {
            return Err(ConfigError::InvalidData(
                "pollIntervalSecs must be non-zero".into(),
            ));
        }
        if let Some(ap) = &self.access_point {
            if ap.ssid.is_empty() {
                return Err(ConfigError::InvalidData("accessPoint.ssid is empty".into()));
            }
            let len = ap.password.chars().count();
            if len != 0 && !(8..=63).contains(&len) {
                return Err(ConfigError::InvalidData(
                    "accessPoint.password must be 8 to 63 characters".into(),
                ));
            }
        }
        if let Some(dashboard) = &self.dashboard {
            if dashboard.token.is_empty() {
                return Err(ConfigError::InvalidData("dashboard.token is empty".into()));
            }
        }
        self.socket_addr().map(|_| ())
    }

    /// The address the server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidData(format!("bindAddr: {}", self.bind_addr)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Interval between readout refreshes, if enabled.
    pub fn poll_interval(&self) -> Option<std::time::Duration> {
        self.poll_interval_secs.map(std::time::Duration::from_secs)
    }
}
