//! WS2812 (NeoPixel) LED driven over RMT.

use core::time::Duration;

use devctl_core::{DeviceError, LedDriver, Rgb};
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::{FixedLengthSignal, PinState, Pulse, RmtChannel, TxRmtDriver};
use esp_idf_hal::sys::EspError;

/// Single on-board NeoPixel.
pub struct NeoPixel {
    tx: TxRmtDriver<'static>,
}

impl NeoPixel {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'static,
        pin: impl Peripheral<P = impl OutputPin> + 'static,
    ) -> Result<Self, DeviceError> {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config).map_err(hardware_err)?;
        Ok(Self { tx })
    }

    fn transmit(&mut self, color: Rgb) -> Result<(), EspError> {
        let ticks_hz = self.tx.counter_clock()?;
        let t0h = Pulse::new_with_duration(ticks_hz, PinState::High, &ns(350))?;
        let t0l = Pulse::new_with_duration(ticks_hz, PinState::Low, &ns(800))?;
        let t1h = Pulse::new_with_duration(ticks_hz, PinState::High, &ns(700))?;
        let t1l = Pulse::new_with_duration(ticks_hz, PinState::Low, &ns(600))?;

        // WS2812 expects GRB, most significant bit first.
        let grb = (u32::from(color.g) << 16) | (u32::from(color.r) << 8) | u32::from(color.b);

        let mut signal = FixedLengthSignal::<24>::new();
        for i in 0..24 {
            let bit = (grb >> (23 - i)) & 1 != 0;
            let (high_pulse, low_pulse) = if bit { (t1h, t1l) } else { (t0h, t0l) };
            signal.set(i, &(high_pulse, low_pulse))?;
        }
        self.tx.start_blocking(&signal)
    }
}

impl LedDriver for NeoPixel {
    fn set_color(&mut self, color: Rgb) -> Result<(), DeviceError> {
        self.transmit(color).map_err(hardware_err)
    }
}

fn ns(nanos: u64) -> Duration {
    Duration::from_nanos(nanos)
}

fn hardware_err(e: EspError) -> DeviceError {
    DeviceError::Hardware(e.to_string())
}
