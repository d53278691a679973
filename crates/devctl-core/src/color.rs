//! Hue to RGB conversion for the hue slider.
//!
//! A one-byte hue maps onto the full color wheel at full saturation and
//! brightness. The ramp channel is computed in `f64` and truncated, so
//! results match the firmware this replaces value for value (hue 43 gives a
//! red of 251, not the 252 an exact rational computation would round to).

use crate::model::Rgb;

/// Convert a hue in `0..=255` (one full turn) to an RGB color.
pub fn hue_to_rgb(hue: u8) -> Rgb {
    let degrees = f64::from(hue) / 255.0 * 360.0;
    let x = ((1.0 - ((degrees / 60.0) % 2.0 - 1.0).abs()) * 255.0) as u8;

    if degrees < 60.0 {
        Rgb::new(255, x, 0)
    } else if degrees < 120.0 {
        Rgb::new(x, 255, 0)
    } else if degrees < 180.0 {
        Rgb::new(0, 255, x)
    } else if degrees < 240.0 {
        Rgb::new(0, x, 255)
    } else if degrees < 300.0 {
        Rgb::new(x, 0, 255)
    } else {
        Rgb::new(255, 0, x)
    }
}
