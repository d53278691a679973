//! Firmware settings.
//!
//! There is no filesystem to load settings from, so credentials are baked in
//! at build time from environment variables:
//!
//! | Variable              | Setting              |
//! |-----------------------|----------------------|
//! | `DEVCTL_WIFI_SSID`    | `wifi.ssid`          |
//! | `DEVCTL_WIFI_PASS`    | `wifi.password`      |
//! | `DEVCTL_AP_SSID`      | `accessPoint.ssid`   |
//! | `DEVCTL_AP_PASS`      | `accessPoint.password` |
//! | `DEVCTL_BLYNK_TOKEN`  | `dashboard.token`    |
//!
//! Everything else keeps the defaults from [`Settings::default`].

use devctl_core::config::{AccessPointSettings, DashboardSettings, WifiSettings};
use devctl_core::{ConfigError, Settings};

/// Build the firmware settings and validate them.
pub fn firmware_settings() -> Result<Settings, ConfigError> {
    let defaults = AccessPointSettings::default();

    let settings = Settings {
        wifi: WifiSettings {
            ssid: option_env!("DEVCTL_WIFI_SSID").unwrap_or_default().to_string(),
            password: option_env!("DEVCTL_WIFI_PASS").unwrap_or_default().to_string(),
        },
        access_point: Some(AccessPointSettings {
            ssid: option_env!("DEVCTL_AP_SSID")
                .map(str::to_string)
                .unwrap_or(defaults.ssid),
            password: option_env!("DEVCTL_AP_PASS")
                .map(str::to_string)
                .unwrap_or(defaults.password),
        }),
        dashboard: option_env!("DEVCTL_BLYNK_TOKEN").map(|token| DashboardSettings {
            token: token.to_string(),
            server: "blynk.cloud".to_string(),
        }),
        ..Settings::default()
    };

    settings.validate()?;
    Ok(settings)
}
