//! # devctl-core
//!
//! Core device model and collaborator interfaces.
//!
//! This crate provides:
//! - Data model types (Rgb, SensorReading, Alert)
//! - Collaborator traits for the LED, display, sensor, network and dashboard
//! - In-memory collaborators for tests and host simulation
//! - OLED text wrapping and hue conversion
//! - Server settings
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! making it usable on both Linux (tokio) and ESP32 (esp-idf) targets.

pub mod color;
pub mod config;
pub mod devices;
pub mod model;
pub mod readout;
pub mod sim;
pub mod text;

pub use config::{ConfigError, Settings};
pub use devices::{
    DashboardClient, DeviceError, DisplayDriver, LedDriver, NetworkProvisioner, SensorDriver,
    Shared,
};
pub use model::*;
