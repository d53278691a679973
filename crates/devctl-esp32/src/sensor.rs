//! DHT11 temperature/humidity sensor.

use devctl_core::{SensorDriver, SensorReading};
use dht_sensor::{dht11, DhtReading as _};
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, InputOutput, PinDriver};
use esp_idf_hal::sys::EspError;
use log::warn;

/// DHT11 on a single open-drain data pin.
pub struct Dht11 {
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
}

impl Dht11 {
    pub fn new(pin: AnyIOPin) -> Result<Self, EspError> {
        let mut pin = PinDriver::input_output_od(pin)?;
        // The line idles high between measurements.
        pin.set_high()?;
        Ok(Self { pin })
    }
}

impl SensorDriver for Dht11 {
    fn read(&mut self) -> SensorReading {
        match dht11::Reading::read(&mut Ets, &mut self.pin) {
            Ok(reading) => SensorReading::new(
                f32::from(reading.temperature),
                f32::from(reading.relative_humidity),
            ),
            Err(e) => {
                warn!("DHT11 read failed: {:?}", e);
                SensorReading::unavailable()
            }
        }
    }
}
