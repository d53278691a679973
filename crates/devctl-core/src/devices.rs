//! Collaborator interfaces.
//!
//! The dispatcher never talks to hardware directly. Each capability is a
//! narrow trait implemented differently on each platform:
//! - ESP32: NeoPixel over RMT, SSD1306 over I2C, DHT11, ESP-IDF Wi-Fi
//! - Linux: in-memory simulations (see [`crate::sim`])
//!
//! All methods are synchronous to support embedded platforms.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::model::{Rgb, SensorReading};

/// Errors reported by collaborators.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The driver reported a hardware failure.
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// The device is not present or not initialized.
    #[error("{0} is unavailable")]
    Unavailable(&'static str),

    /// Another user of the device panicked while holding it.
    #[error("{0} lock is poisoned")]
    Poisoned(&'static str),

    /// Wi-Fi or dashboard communication failed.
    #[error("Network error: {0}")]
    Network(String),
}

/// Single-pixel RGB LED.
pub trait LedDriver: Send {
    /// Set the LED color and write it through to the hardware.
    fn set_color(&mut self, color: Rgb) -> Result<(), DeviceError>;
}

/// Buffered text display.
///
/// Drawing calls only touch the buffer; nothing is visible until
/// [`DisplayDriver::commit`].
pub trait DisplayDriver: Send {
    /// Blank the buffer.
    fn clear(&mut self) -> Result<(), DeviceError>;

    /// Draw one line of text with its top-left corner at `(x, y)`.
    fn write_line(&mut self, text: &str, x: i32, y: i32) -> Result<(), DeviceError>;

    /// Push the buffer to the panel.
    fn commit(&mut self) -> Result<(), DeviceError>;
}

/// Temperature/humidity sensor.
pub trait SensorDriver: Send {
    /// Take a measurement. Failures are reported as an empty reading, never
    /// as an error.
    fn read(&mut self) -> SensorReading;
}

/// Wi-Fi bring-up, invoked once at startup.
pub trait NetworkProvisioner {
    /// Join the configured network in station mode and return the IP address.
    fn ensure_connected(&mut self) -> Result<String, DeviceError>;

    /// Start a local access point and return its IP address.
    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<String, DeviceError>;
}

/// Cloud dashboard that accepts values on numbered virtual pins.
pub trait DashboardClient: Send {
    fn virtual_write(&mut self, pin: u8, value: f32) -> Result<(), DeviceError>;
}

/// A collaborator shared between the dispatcher and the readout poller.
pub type Shared<T> = Arc<Mutex<T>>;

/// Wrap a collaborator for sharing.
pub fn shared<T>(device: T) -> Shared<T> {
    Arc::new(Mutex::new(device))
}

/// Lock a shared collaborator, mapping poisoning to a [`DeviceError`].
pub fn lock<'a, T: ?Sized>(device: &'a Mutex<T>, name: &'static str) -> Result<MutexGuard<'a, T>, DeviceError> {
    device.lock().map_err(|_| DeviceError::Poisoned(name))
}
