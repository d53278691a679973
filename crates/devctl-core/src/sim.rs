//! In-memory collaborators.
//!
//! Used by the Linux server binary to run without hardware, and by tests as
//! fixtures. They record what was applied so it can be inspected afterwards.

use std::collections::VecDeque;

use crate::devices::{DashboardClient, DeviceError, DisplayDriver, LedDriver, SensorDriver};
use crate::model::{Rgb, SensorReading};

/// LED that remembers the last color written.
#[derive(Debug, Default)]
pub struct MemoryLed {
    color: Rgb,
    writes: usize,
}

impl MemoryLed {
    pub fn new() -> Self {
        Self::default()
    }

    /// The color currently shown.
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Number of times a color was written.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl LedDriver for MemoryLed {
    fn set_color(&mut self, color: Rgb) -> Result<(), DeviceError> {
        self.color = color;
        self.writes += 1;
        Ok(())
    }
}

/// A line of text placed on the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnLine {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// Display with a draw buffer and the last committed frame.
#[derive(Debug, Default)]
pub struct MemoryDisplay {
    buffer: Vec<DrawnLine>,
    frame: Vec<DrawnLine>,
    commits: usize,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines visible on the panel after the last commit.
    pub fn frame(&self) -> &[DrawnLine] {
        &self.frame
    }

    /// Text of the visible lines, top to bottom.
    pub fn frame_text(&self) -> Vec<&str> {
        self.frame.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl DisplayDriver for MemoryDisplay {
    fn clear(&mut self) -> Result<(), DeviceError> {
        self.buffer.clear();
        Ok(())
    }

    fn write_line(&mut self, text: &str, x: i32, y: i32) -> Result<(), DeviceError> {
        self.buffer.push(DrawnLine {
            text: text.to_string(),
            x,
            y,
        });
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DeviceError> {
        self.frame = self.buffer.clone();
        self.commits += 1;
        Ok(())
    }
}

/// Sensor that replays a fixed script of readings.
///
/// Once the script is exhausted the last reading repeats. An empty script
/// behaves like a disconnected sensor.
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    script: VecDeque<SensorReading>,
    last: SensorReading,
    reads: usize,
}

impl ScriptedSensor {
    pub fn new(readings: impl IntoIterator<Item = SensorReading>) -> Self {
        Self {
            script: readings.into_iter().collect(),
            last: SensorReading::unavailable(),
            reads: 0,
        }
    }

    /// Sensor that always returns the same values.
    pub fn fixed(temperature: f32, humidity: f32) -> Self {
        Self::new([SensorReading::new(temperature, humidity)])
    }

    /// Sensor that never answers.
    pub fn disconnected() -> Self {
        Self::new([])
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SensorDriver for ScriptedSensor {
    fn read(&mut self) -> SensorReading {
        self.reads += 1;
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}

/// Sensor that drifts slowly around a base value, like a room over a day.
///
/// Every `fail_every`th read fails, the way a DHT11 occasionally misses a
/// handshake. DHT11 values are whole numbers, so these are too.
#[derive(Debug)]
pub struct DriftingSensor {
    base: SensorReading,
    step: u32,
    fail_every: Option<u32>,
}

impl DriftingSensor {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            base: SensorReading::new(temperature, humidity),
            step: 0,
            fail_every: None,
        }
    }

    pub fn with_failures(mut self, every: u32) -> Self {
        self.fail_every = (every > 0).then_some(every);
        self
    }
}

impl SensorDriver for DriftingSensor {
    fn read(&mut self) -> SensorReading {
        self.step = self.step.wrapping_add(1);
        if matches!(self.fail_every, Some(n) if self.step % n == 0) {
            return SensorReading::unavailable();
        }

        // Triangle wave: 0,1,2,3,2,1,0,-1,-2,-3,-2,-1,...
        let phase = (self.step % 12) as i32;
        let offset = match phase {
            0..=3 => phase,
            4..=9 => 6 - phase,
            _ => phase - 12,
        } as f32;

        SensorReading {
            temperature: self.base.temperature.map(|t| (t + offset).round()),
            humidity: self.base.humidity.map(|h| (h - 2.0 * offset).round()),
        }
    }
}

/// Dashboard that keeps every value written per virtual pin.
#[derive(Debug, Default)]
pub struct MemoryDashboard {
    writes: Vec<(u8, f32)>,
    offline: bool,
}

impl MemoryDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dashboard whose writes always fail.
    pub fn offline() -> Self {
        Self {
            writes: Vec::new(),
            offline: true,
        }
    }

    pub fn writes(&self) -> &[(u8, f32)] {
        &self.writes
    }

    /// The last value written to `pin`.
    pub fn last(&self, pin: u8) -> Option<f32> {
        self.writes
            .iter()
            .rev()
            .find(|(p, _)| *p == pin)
            .map(|(_, v)| *v)
    }
}

impl DashboardClient for MemoryDashboard {
    fn virtual_write(&mut self, pin: u8, value: f32) -> Result<(), DeviceError> {
        if self.offline {
            return Err(DeviceError::Network("dashboard offline".to_string()));
        }
        self.writes.push((pin, value));
        Ok(())
    }
}
