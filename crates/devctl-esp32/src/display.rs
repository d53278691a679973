//! SSD1306 128x64 OLED over I2C.

use devctl_core::{DeviceError, DisplayDriver};
use embedded_graphics::{
    mono_font::{ascii::FONT_8X13, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

type Panel = Ssd1306<
    I2CInterface<I2cDriver<'static>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// Buffered OLED. Drawing goes to RAM until [`DisplayDriver::commit`].
pub struct Oled {
    panel: Panel,
    style: MonoTextStyle<'static, BinaryColor>,
}

impl Oled {
    pub fn new(i2c: I2cDriver<'static>) -> Result<Self, DeviceError> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        panel.init().map_err(display_err)?;

        Ok(Self {
            panel,
            style: MonoTextStyle::new(&FONT_8X13, BinaryColor::On),
        })
    }
}

impl DisplayDriver for Oled {
    fn clear(&mut self) -> Result<(), DeviceError> {
        self.panel.clear_buffer();
        Ok(())
    }

    fn write_line(&mut self, text: &str, x: i32, y: i32) -> Result<(), DeviceError> {
        // Coordinates address the top-left corner of the text.
        Text::with_baseline(text, Point::new(x, y), self.style, Baseline::Top)
            .draw(&mut self.panel)
            .map_err(display_err)?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DeviceError> {
        self.panel.flush().map_err(display_err)
    }
}

fn display_err<E: core::fmt::Debug>(e: E) -> DeviceError {
    DeviceError::Hardware(format!("display: {:?}", e))
}
