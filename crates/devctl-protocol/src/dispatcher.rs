//! The request dispatcher.
//!
//! Turns one raw request into a device action and a response:
//! read (bounded) → classify → act → respond → close.
//!
//! [`Dispatcher::dispatch`] holds the logic and is shared by every runtime.
//! [`Dispatcher::handle_connection`] is the blocking `std::io` wrapper used
//! by the ESP32 firmware; the tokio server has its own async wrapper.

use std::io::{Read, Write};

use devctl_core::color::hue_to_rgb;
use devctl_core::devices::lock;
use devctl_core::text::{self, wrap_message, MESSAGE_X};
use devctl_core::{DisplayDriver, LedDriver, Rgb, SensorDriver, SensorReading, Shared};
use tracing::{debug, info, warn};

use crate::error::ProtocolError;
use crate::page;
use crate::request::Command;
use crate::response::{Response, SensorSnapshot};
use crate::DEFAULT_READ_LIMIT;

/// Position of the hue label on the OLED.
const HUE_LABEL_POS: (i32, i32) = (10, 24);

/// Dispatches requests to the LED, display and sensor collaborators.
///
/// Collaborators are shared so a readout poller can use the display and
/// sensor too. Each is locked only for the duration of one driver call
/// sequence.
pub struct Dispatcher<L: ?Sized, D: ?Sized, S: ?Sized> {
    led: Shared<L>,
    display: Shared<D>,
    sensor: Shared<S>,
    read_limit: usize,
}

impl<L, D, S> Dispatcher<L, D, S>
where
    L: LedDriver + ?Sized,
    D: DisplayDriver + ?Sized,
    S: SensorDriver + ?Sized,
{
    /// Create a dispatcher reading at most [`DEFAULT_READ_LIMIT`] bytes per
    /// request.
    pub fn new(led: Shared<L>, display: Shared<D>, sensor: Shared<S>) -> Self {
        Self {
            led,
            display,
            sensor,
            read_limit: DEFAULT_READ_LIMIT,
        }
    }

    /// Change the per-request read limit. A zero limit is raised to one byte.
    pub fn with_read_limit(mut self, read_limit: usize) -> Self {
        self.read_limit = read_limit.max(1);
        self
    }

    pub fn read_limit(&self) -> usize {
        self.read_limit
    }

    pub fn display(&self) -> &Shared<D> {
        &self.display
    }

    pub fn sensor(&self) -> &Shared<S> {
        &self.sensor
    }

    /// Serve one connection: a single bounded read, then one write.
    ///
    /// Never fails. Errors are logged. The caller closes the connection when
    /// this returns (dropping `conn` is enough for sockets).
    pub fn handle_connection<C: Read + Write>(&self, mut conn: C) {
        let mut buf = vec![0u8; self.read_limit];
        let n = match conn.read(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to read request: {}", e);
                return;
            }
        };

        let Some(response) = self.dispatch(&buf[..n]) else {
            debug!("Peer closed without sending data");
            return;
        };

        if let Err(e) = conn.write_all(&response.encode()).and_then(|_| conn.flush()) {
            warn!("{}", ProtocolError::ResponseWriteFailure(e));
        }
    }

    /// Classify a raw request, apply it and build the response.
    ///
    /// Returns `None` for an empty request, which gets no response.
    pub fn dispatch(&self, raw: &[u8]) -> Option<Response> {
        if raw.is_empty() {
            return None;
        }
        if raw.len() >= self.read_limit {
            debug!("{}", ProtocolError::TruncatedRead(self.read_limit));
        }

        let request = String::from_utf8_lossy(raw);
        debug!("Request: {}", request.lines().next().unwrap_or_default());

        let command = match Command::parse(&request) {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                Command::Unknown
            }
        };

        if let Err(e) = self.apply(&command) {
            warn!("Failed to apply {:?}: {}", command, e);
        }

        Some(match command {
            Command::FetchSensorSnapshot => self.snapshot_response(),
            _ => Response::html(page::render(&self.read_sensor())),
        })
    }

    /// Perform the device side effect of a command.
    pub fn apply(&self, command: &Command) -> Result<(), ProtocolError> {
        match command {
            Command::SetColor(color) => self.set_color(*color),
            Command::ShowMessage(message) => self.show_message(message),
            Command::SetHue(hue) => self.set_hue(*hue),
            Command::FetchSensorSnapshot | Command::Unknown => Ok(()),
        }
    }

    fn set_color(&self, color: Rgb) -> Result<(), ProtocolError> {
        lock(&self.led, "led")?.set_color(color)?;
        info!("LED updated: {}", color);
        Ok(())
    }

    fn show_message(&self, message: &str) -> Result<(), ProtocolError> {
        let lines = wrap_message(message);

        let mut display = lock(&self.display, "display")?;
        display.clear()?;
        for (i, line) in lines.iter().enumerate() {
            display.write_line(line, MESSAGE_X, text::line_y(i))?;
        }
        display.commit()?;

        info!("OLED message: {:?}", lines);
        Ok(())
    }

    fn set_hue(&self, hue: u8) -> Result<(), ProtocolError> {
        let color = hue_to_rgb(hue);

        {
            let mut display = lock(&self.display, "display")?;
            display.clear()?;
            display.write_line(&format!("Hue: {}", hue), HUE_LABEL_POS.0, HUE_LABEL_POS.1)?;
            display.commit()?;
        }

        lock(&self.led, "led")?.set_color(color)?;
        info!("Hue {} applied: {}", hue, color);
        Ok(())
    }

    fn read_sensor(&self) -> SensorReading {
        match lock(&self.sensor, "sensor") {
            Ok(mut sensor) => {
                let reading = sensor.read();
                if !reading.is_complete() {
                    warn!("{}", ProtocolError::SensorUnavailable);
                }
                reading
            }
            Err(e) => {
                warn!("{}", e);
                SensorReading::unavailable()
            }
        }
    }

    fn snapshot_response(&self) -> Response {
        let snapshot = SensorSnapshot::from_reading(&self.read_sensor());
        match snapshot.to_json() {
            Ok(json) => Response::json(json),
            Err(e) => {
                warn!("Failed to encode snapshot: {}", e);
                Response::json(r#"{"temperature":null,"humidity":null,"alert":"Weather is normal."}"#)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ContentType;
    use devctl_core::devices::{shared, DeviceError};
    use devctl_core::sim::{MemoryDisplay, MemoryLed, ScriptedSensor};
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::{Arc, Mutex};

    type TestDispatcher = Dispatcher<MemoryLed, MemoryDisplay, ScriptedSensor>;

    struct Fixture {
        led: Shared<MemoryLed>,
        display: Shared<MemoryDisplay>,
        sensor: Shared<ScriptedSensor>,
        dispatcher: TestDispatcher,
    }

    fn fixture(sensor: ScriptedSensor) -> Fixture {
        let led = shared(MemoryLed::new());
        let display = shared(MemoryDisplay::new());
        let sensor = shared(sensor);
        let dispatcher = Dispatcher::new(led.clone(), display.clone(), sensor.clone());
        Fixture {
            led,
            display,
            sensor,
            dispatcher,
        }
    }

    fn get(target: &str) -> Vec<u8> {
        format!("GET {} HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n", target).into_bytes()
    }

    /// In-memory connection with scripted input and captured output.
    #[derive(Default)]
    struct MockConn {
        input: io::Cursor<Vec<u8>>,
        output: Vec<u8>,
        reads: usize,
        fail_writes: bool,
    }

    impl MockConn {
        fn new(input: Vec<u8>) -> Self {
            Self {
                input: io::Cursor::new(input),
                ..Default::default()
            }
        }

        fn output(&self) -> String {
            String::from_utf8(self.output.clone()).unwrap()
        }
    }

    impl Read for MockConn {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            self.input.read(buf)
        }
    }

    impl Write for MockConn {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// LED whose writes always fail.
    struct BrokenLed;

    impl LedDriver for BrokenLed {
        fn set_color(&mut self, _color: Rgb) -> Result<(), DeviceError> {
            Err(DeviceError::Hardware("rmt timeout".to_string()))
        }
    }

    #[test]
    fn test_set_color_applies_and_serves_page() {
        let f = fixture(ScriptedSensor::fixed(22.0, 40.0));
        let response = f.dispatcher.dispatch(&get("/?r=300&g=-1&b=42")).unwrap();

        assert_eq!(f.led.lock().unwrap().color(), Rgb::new(255, 0, 42));
        assert_eq!(response.content_type, ContentType::Html);
        assert!(response.body.contains("Temperature: 22&deg;C"));
    }

    #[test]
    fn test_malformed_color_still_serves_page() {
        let f = fixture(ScriptedSensor::fixed(22.0, 40.0));
        let response = f.dispatcher.dispatch(&get("/?r=x&g=1&b=2")).unwrap();

        assert_eq!(f.led.lock().unwrap().writes(), 0);
        assert_eq!(response.content_type, ContentType::Html);
    }

    #[test]
    fn test_show_message_wraps_lines() {
        let f = fixture(ScriptedSensor::disconnected());
        f.dispatcher
            .dispatch(&get("/?msg=the%20quick%20brown%20fox%20jumps%20over%20the%20lazy%20dog"))
            .unwrap();

        let display = f.display.lock().unwrap();
        assert_eq!(
            display.frame_text(),
            vec!["the quick brown", "fox jumps over", "the lazy dog"]
        );
        let ys: Vec<i32> = display.frame().iter().map(|l| l.y).collect();
        assert_eq!(ys, vec![0, 16, 32]);
        assert!(display.frame().iter().all(|l| l.x == 5));
    }

    #[test]
    fn test_show_message_limits() {
        let f = fixture(ScriptedSensor::disconnected());
        let long = "word%20".repeat(40);
        f.dispatcher.dispatch(&get(&format!("/?msg={}", long))).unwrap();

        let display = f.display.lock().unwrap();
        assert!(display.frame().len() <= 4);
        assert!(display.frame().iter().all(|l| l.text.chars().count() <= 16));
    }

    #[test]
    fn test_set_hue() {
        let f = fixture(ScriptedSensor::disconnected());
        f.dispatcher.dispatch(&get("/?hue=0")).unwrap();

        assert_eq!(f.led.lock().unwrap().color(), Rgb::new(255, 0, 0));
        let display = f.display.lock().unwrap();
        assert_eq!(display.frame_text(), vec!["Hue: 0"]);
        assert_eq!((display.frame()[0].x, display.frame()[0].y), (10, 24));
    }

    #[test]
    fn test_snapshot() {
        let f = fixture(ScriptedSensor::fixed(20.0, 80.0));
        let response = f.dispatcher.dispatch(&get("/data")).unwrap();

        assert_eq!(response.content_type, ContentType::Json);
        let value: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(value["temperature"], 20.0);
        assert_eq!(value["humidity"], 80.0);
        assert_eq!(value["alert"], "High humidity! Stay hydrated.");
    }

    #[test]
    fn test_snapshot_sensor_failure() {
        let f = fixture(ScriptedSensor::disconnected());
        let response = f.dispatcher.dispatch(&get("/data")).unwrap();

        let value: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert!(value["temperature"].is_null());
        assert!(value["humidity"].is_null());
        assert_eq!(value["alert"], "Weather is normal.");
    }

    #[test]
    fn test_unknown_does_not_touch_devices() {
        let f = fixture(ScriptedSensor::fixed(22.0, 40.0));
        let response = f.dispatcher.dispatch(&get("/")).unwrap();

        assert_eq!(response.content_type, ContentType::Html);
        assert_eq!(f.led.lock().unwrap().writes(), 0);
        assert_eq!(f.display.lock().unwrap().commits(), 0);
    }

    #[test]
    fn test_empty_request_gets_no_response() {
        let f = fixture(ScriptedSensor::disconnected());
        assert!(f.dispatcher.dispatch(&[]).is_none());
    }

    #[test]
    fn test_led_failure_still_serves_page() {
        let display = shared(MemoryDisplay::new());
        let sensor = shared(ScriptedSensor::disconnected());
        let led: Shared<dyn LedDriver> = Arc::new(Mutex::new(BrokenLed));
        let dispatcher = Dispatcher::new(led, display, sensor);

        let response = dispatcher.dispatch(&get("/?r=1&g=2&b=3")).unwrap();
        assert_eq!(response.content_type, ContentType::Html);
    }

    #[test]
    fn test_handle_connection_writes_response() {
        let f = fixture(ScriptedSensor::fixed(22.0, 40.0));
        let mut conn = MockConn::new(get("/data"));
        f.dispatcher.handle_connection(&mut conn);

        let output = conn.output();
        assert!(output.starts_with("HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n"));
        assert!(output.ends_with(r#""alert":"Weather is normal."}"#));
        assert_eq!(conn.reads, 1);
    }

    #[test]
    fn test_handle_connection_zero_bytes() {
        let f = fixture(ScriptedSensor::fixed(22.0, 40.0));
        let mut conn = MockConn::new(Vec::new());
        f.dispatcher.handle_connection(&mut conn);

        assert!(conn.output.is_empty());
        assert_eq!(f.sensor.lock().unwrap().reads(), 0);
    }

    #[test]
    fn test_handle_connection_truncates_at_read_limit() {
        let f = fixture(ScriptedSensor::disconnected());
        let dispatcher = Dispatcher::new(f.led.clone(), f.display.clone(), f.sensor.clone())
            .with_read_limit(16);
        // The first 16 bytes are "GET /?msg=abcdef"; the rest is never read.
        let mut conn = MockConn::new(get("/?msg=abcdefghijkl"));
        dispatcher.handle_connection(&mut conn);

        assert_eq!(conn.reads, 1);
        assert_eq!(f.display.lock().unwrap().frame_text(), vec!["abcdef"]);
        assert!(conn.output().starts_with("HTTP/1.1 200 OK"));
    }

    #[test]
    fn test_handle_connection_write_failure() {
        let f = fixture(ScriptedSensor::disconnected());
        let mut conn = MockConn::new(get("/?r=1&g=2&b=3"));
        conn.fail_writes = true;
        f.dispatcher.handle_connection(&mut conn);

        // The action still happened; the failure is only logged.
        assert_eq!(f.led.lock().unwrap().color(), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_read_limit_floor() {
        let f = fixture(ScriptedSensor::disconnected());
        let dispatcher = Dispatcher::new(f.led.clone(), f.display.clone(), f.sensor.clone())
            .with_read_limit(0);
        assert_eq!(dispatcher.read_limit(), 1);
        assert_eq!(f.dispatcher.read_limit(), DEFAULT_READ_LIMIT);
    }
}
