//! Device data model types.
//!
//! These types are request-scoped values passed between the dispatcher and
//! the collaborators:
//! - Rgb colors applied to the LED
//! - Sensor readings and the alert derived from them

use serde::{Deserialize, Serialize};

/// An LED color with one byte per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// LED off.
    pub const OFF: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from unbounded channel values, clamping each into [0, 255].
    pub fn clamped(r: i64, g: i64, b: i64) -> Self {
        Self {
            r: clamp_channel(r),
            g: clamp_channel(g),
            b: clamp_channel(b),
        }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R={}, G={}, B={}", self.r, self.g, self.b)
    }
}

/// Clamp an integer into the range of a single color channel.
pub fn clamp_channel(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}

/// One temperature/humidity measurement.
///
/// Both fields are `None` when the sensor could not be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Temperature in degrees Celsius.
    pub temperature: Option<f32>,
    /// Relative humidity in percent.
    pub humidity: Option<f32>,
}

impl SensorReading {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature: Some(temperature),
            humidity: Some(humidity),
        }
    }

    /// A reading from a sensor that failed to respond.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Whether both values are present.
    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some()
    }

    pub fn alert(&self) -> Alert {
        Alert::classify(self.temperature, self.humidity)
    }
}

/// Weather alert derived from a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alert {
    Hot,
    Cold,
    Dry,
    Humid,
    Normal,
}

impl Alert {
    pub const HOT_ABOVE: f32 = 30.0;
    pub const COLD_BELOW: f32 = 15.0;
    pub const DRY_BELOW: f32 = 30.0;
    pub const HUMID_ABOVE: f32 = 70.0;

    /// Classify a reading. The first matching rule wins, temperature before
    /// humidity. A missing value always yields [`Alert::Normal`].
    pub fn classify(temperature: Option<f32>, humidity: Option<f32>) -> Self {
        let (Some(t), Some(h)) = (temperature, humidity) else {
            return Alert::Normal;
        };

        if t > Self::HOT_ABOVE {
            Alert::Hot
        } else if t < Self::COLD_BELOW {
            Alert::Cold
        } else if h < Self::DRY_BELOW {
            Alert::Dry
        } else if h > Self::HUMID_ABOVE {
            Alert::Humid
        } else {
            Alert::Normal
        }
    }

    /// Human readable message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Alert::Hot => "It's hot! Stay cool.",
            Alert::Cold => "It's cold! Stay warm.",
            Alert::Dry => "It's dry! Stay moisturized.",
            Alert::Humid => "High humidity! Stay hydrated.",
            Alert::Normal => "Weather is normal.",
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_channels() {
        assert_eq!(Rgb::clamped(-5, 128, 300), Rgb::new(0, 128, 255));
        assert_eq!(Rgb::clamped(i64::MIN, i64::MAX, 0), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::clamped(0, 255, 1), Rgb::new(0, 255, 1));
    }

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "R=1, G=2, B=3");
    }

    #[test]
    fn test_alert_temperature_wins_over_humidity() {
        assert_eq!(Alert::classify(Some(32.0), Some(80.0)), Alert::Hot);
        assert_eq!(Alert::classify(Some(10.0), Some(20.0)), Alert::Cold);
    }

    #[test]
    fn test_alert_missing_values() {
        assert_eq!(Alert::classify(None, Some(50.0)), Alert::Normal);
        assert_eq!(Alert::classify(Some(35.0), None), Alert::Normal);
        assert_eq!(Alert::classify(None, None), Alert::Normal);
    }

    #[test]
    fn test_alert_humidity_rules() {
        assert_eq!(Alert::classify(Some(20.0), Some(80.0)), Alert::Humid);
        assert_eq!(Alert::classify(Some(20.0), Some(25.0)), Alert::Dry);
        assert_eq!(Alert::classify(Some(20.0), Some(50.0)), Alert::Normal);
    }

    #[test]
    fn test_alert_boundaries_are_exclusive() {
        assert_eq!(Alert::classify(Some(30.0), Some(30.0)), Alert::Normal);
        assert_eq!(Alert::classify(Some(15.0), Some(70.0)), Alert::Normal);
        assert_eq!(Alert::classify(Some(30.5), Some(50.0)), Alert::Hot);
        assert_eq!(Alert::classify(Some(14.9), Some(50.0)), Alert::Cold);
    }

    #[test]
    fn test_alert_messages() {
        assert_eq!(Alert::Hot.message(), "It's hot! Stay cool.");
        assert_eq!(Alert::Cold.message(), "It's cold! Stay warm.");
        assert_eq!(Alert::Humid.message(), "High humidity! Stay hydrated.");
        assert_eq!(Alert::Normal.to_string(), "Weather is normal.");
    }

    #[test]
    fn test_reading_alert() {
        assert_eq!(SensorReading::new(32.0, 80.0).alert(), Alert::Hot);
        assert_eq!(SensorReading::unavailable().alert(), Alert::Normal);
        assert!(!SensorReading::unavailable().is_complete());
        assert!(SensorReading::new(20.0, 40.0).is_complete());
    }
}
