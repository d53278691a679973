//! ESP32-specific components for the device control server.
//!
//! This crate provides the hardware side of the collaborator traits in
//! `devctl-core`:
//! - WiFi station and access point bring-up
//! - WS2812 (NeoPixel) LED over RMT
//! - SSD1306 OLED over I2C
//! - DHT11 temperature/humidity sensor
//! - Blynk dashboard over HTTP
//!
//! plus the blocking accept loop and readout thread that drive them.
//!
//! # Example
//!
//! ```ignore
//! use devctl_esp32::wifi::EspNetwork;
//!
//! let mut network = EspNetwork::new(peripherals.modem, sysloop, Some(nvs), &settings.wifi)?;
//! let ip = network.ensure_connected()?;
//! ```

pub mod config;
pub mod dashboard;
pub mod display;
pub mod led;
pub mod sensor;
pub mod serve;
pub mod wifi;
