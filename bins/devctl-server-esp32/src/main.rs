//! Device control firmware for ESP32-S3.
//!
//! This binary requires the ESP32 Rust toolchain.
//! It will not compile with the standard Rust toolchain.
//!
//! Wiring:
//! - NeoPixel data: GPIO48 (on-board LED of the DevKitC-1)
//! - DHT11 data:    GPIO4
//! - SSD1306 OLED:  SDA GPIO8, SCL GPIO9
//!
//! WiFi and dashboard credentials are read at build time, see
//! [`devctl_esp32::config`].

use devctl_core::devices::shared;
use devctl_core::{DashboardClient, NetworkProvisioner};
use devctl_esp32::config::firmware_settings;
use devctl_esp32::dashboard::BlynkDashboard;
use devctl_esp32::display::Oled;
use devctl_esp32::led::NeoPixel;
use devctl_esp32::sensor::Dht11;
use devctl_esp32::serve;
use devctl_esp32::wifi::EspNetwork;
use devctl_protocol::Dispatcher;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    info!("Device control firmware starting...");
    let settings = firmware_settings()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Peripherals
    let led = NeoPixel::new(peripherals.rmt.channel0, peripherals.pins.gpio48)?;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8, // SDA
        peripherals.pins.gpio9, // SCL
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    let display = Oled::new(i2c)?;
    let sensor = Dht11::new(peripherals.pins.gpio4.into())?;

    // Network. A station failure ends `main`, and ESP-IDF restarts the chip.
    let mut network = EspNetwork::new(peripherals.modem, sysloop, Some(nvs), &settings.wifi)?;
    let ip = network.ensure_connected()?;
    info!("Station IP: {}", ip);

    if let Some(ap) = &settings.access_point {
        match network.start_access_point(&ap.ssid, &ap.password) {
            Ok(ap_ip) => info!("Access point '{}' IP: {}", ap.ssid, ap_ip),
            Err(e) => warn!("Access point '{}' not started: {}", ap.ssid, e),
        }
    }

    let dispatcher = Dispatcher::new(shared(led), shared(display), shared(sensor))
        .with_read_limit(settings.read_limit);

    if let Some(period) = settings.poll_interval() {
        let dashboard = settings
            .dashboard
            .clone()
            .map(|d| Box::new(BlynkDashboard::new(d)) as Box<dyn DashboardClient>);
        serve::spawn_poller(
            dispatcher.sensor().clone(),
            dispatcher.display().clone(),
            dashboard,
            period,
        )?;
    }

    info!("Open http://{}/ to control the device", ip);
    serve::serve(settings.socket_addr()?, settings.backlog, &dispatcher)?;

    // Keep the WiFi driver alive for as long as the server runs.
    drop(network);
    Ok(())
}
