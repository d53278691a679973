//! Periodic temperature/humidity readout.
//!
//! One refresh reads the sensor, renders the values on the display and
//! forwards them to the dashboard. Runtime wrappers (tokio task, std thread)
//! call [`refresh`] on a fixed interval.

use std::sync::Mutex;

use crate::devices::{lock, DashboardClient, DeviceError, DisplayDriver, SensorDriver};
use crate::model::SensorReading;

/// Dashboard pin receiving the temperature.
pub const TEMPERATURE_PIN: u8 = 0;

/// Dashboard pin receiving the humidity.
pub const HUMIDITY_PIN: u8 = 1;

/// Outcome of one refresh.
#[derive(Debug)]
pub enum Refresh {
    /// Values were displayed. `dashboard` holds the forwarding result.
    Shown {
        reading: SensorReading,
        dashboard: Result<(), DeviceError>,
    },
    /// The sensor did not answer; nothing was touched.
    SensorUnavailable,
}

/// Run one readout cycle.
///
/// The sensor and display are locked one at a time, never together, so a
/// concurrent dispatcher can always make progress.
pub fn refresh<S, D, B>(
    sensor: &Mutex<S>,
    display: &Mutex<D>,
    dashboard: Option<&mut B>,
) -> Result<Refresh, DeviceError>
where
    S: SensorDriver + ?Sized,
    D: DisplayDriver + ?Sized,
    B: DashboardClient + ?Sized,
{
    let reading = lock(sensor, "sensor")?.read();

    let (Some(temperature), Some(humidity)) = (reading.temperature, reading.humidity) else {
        return Ok(Refresh::SensorUnavailable);
    };

    {
        let mut display = lock(display, "display")?;
        display.clear()?;
        display.write_line(&format!("Temp: {} C", temperature), 10, 16)?;
        display.write_line(&format!("Humidity: {} %", humidity), 10, 32)?;
        display.commit()?;
    }

    let dashboard = match dashboard {
        Some(client) => client
            .virtual_write(TEMPERATURE_PIN, round2(temperature))
            .and_then(|_| client.virtual_write(HUMIDITY_PIN, round2(humidity))),
        None => Ok(()),
    };

    Ok(Refresh::Shown { reading, dashboard })
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::shared;
    use crate::sim::{MemoryDashboard, MemoryDisplay, ScriptedSensor};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_refresh_renders_and_forwards() {
        let sensor = shared(ScriptedSensor::fixed(23.0, 45.0));
        let display = shared(MemoryDisplay::new());
        let mut dashboard = MemoryDashboard::new();

        let outcome = refresh(&sensor, &display, Some(&mut dashboard)).unwrap();
        assert!(matches!(outcome, Refresh::Shown { dashboard: Ok(()), .. }));

        let display = display.lock().unwrap();
        assert_eq!(display.frame_text(), vec!["Temp: 23 C", "Humidity: 45 %"]);
        assert_eq!(display.frame()[0].x, 10);
        assert_eq!(display.frame()[0].y, 16);
        assert_eq!(display.frame()[1].y, 32);

        assert_eq!(dashboard.last(TEMPERATURE_PIN), Some(23.0));
        assert_eq!(dashboard.last(HUMIDITY_PIN), Some(45.0));
    }

    #[test]
    fn test_refresh_skips_on_sensor_failure() {
        let sensor = shared(ScriptedSensor::disconnected());
        let display = shared(MemoryDisplay::new());
        let mut dashboard = MemoryDashboard::new();

        let outcome = refresh(&sensor, &display, Some(&mut dashboard)).unwrap();
        assert!(matches!(outcome, Refresh::SensorUnavailable));
        assert_eq!(display.lock().unwrap().commits(), 0);
        assert!(dashboard.writes().is_empty());
    }

    #[test]
    fn test_refresh_reports_dashboard_failure() {
        let sensor = shared(ScriptedSensor::fixed(23.0, 45.0));
        let display = shared(MemoryDisplay::new());
        let mut dashboard = MemoryDashboard::offline();

        let outcome = refresh(&sensor, &display, Some(&mut dashboard)).unwrap();
        match outcome {
            Refresh::Shown { dashboard, .. } => assert!(dashboard.is_err()),
            other => panic!("Expected Shown, got {:?}", other),
        }
        assert_eq!(display.lock().unwrap().commits(), 1);
    }

    #[test]
    fn test_refresh_without_dashboard() {
        let sensor = shared(ScriptedSensor::fixed(23.5, 45.25));
        let display = shared(MemoryDisplay::new());

        let outcome = refresh::<_, _, MemoryDashboard>(&sensor, &display, None).unwrap();
        assert!(matches!(outcome, Refresh::Shown { .. }));
        assert_eq!(
            display.lock().unwrap().frame_text(),
            vec!["Temp: 23.5 C", "Humidity: 45.25 %"]
        );
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(21.456), 21.46);
        assert_eq!(round2(40.0), 40.0);
    }
}
