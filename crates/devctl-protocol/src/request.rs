//! Request classification.
//!
//! Requests are not parsed as HTTP. The raw text is searched for fixed query
//! markers, in priority order:
//! 1. `/?r=`, `&g=` and `&b=` all present: set the LED color
//! 2. `/?msg=`: show a message on the OLED
//! 3. `/?hue=`: set the LED from a hue value
//! 4. `/data`: return a sensor snapshot
//! 5. anything else: serve the control page
//!
//! A query string ends at the first whitespace, which in a well formed
//! request line is the space before the HTTP version.

use devctl_core::{clamp_channel, Rgb};

use crate::error::ProtocolError;

/// Markers that must all be present for a color request.
pub const COLOR_MARKERS: [&str; 3] = ["/?r=", "&g=", "&b="];

/// Marker of a message request.
pub const MESSAGE_MARKER: &str = "/?msg=";

/// Marker of a hue request.
pub const HUE_MARKER: &str = "/?hue=";

/// Marker of a sensor snapshot request.
pub const DATA_MARKER: &str = "/data";

/// Start of a query string.
pub const QUERY_MARKER: &str = "/?";

/// What a request asks the device to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set the LED to a color.
    SetColor(Rgb),
    /// Show a message on the OLED.
    ShowMessage(String),
    /// Set the LED to a hue on the color wheel.
    SetHue(u8),
    /// Return the current sensor reading as JSON.
    FetchSensorSnapshot,
    /// Serve the control page.
    Unknown,
}

impl Command {
    /// Classify a raw request.
    ///
    /// Returns [`ProtocolError::MalformedQuery`] when a color or hue request
    /// carries parameters that cannot be parsed. The caller should still
    /// answer with the control page.
    pub fn parse(request: &str) -> Result<Self, ProtocolError> {
        if COLOR_MARKERS.iter().all(|m| request.contains(m)) {
            let params = QueryParams::parse(query_after(request, QUERY_MARKER).unwrap_or(""))?;
            let r = params.int("r")?.unwrap_or(0);
            let g = params.int("g")?.unwrap_or(0);
            let b = params.int("b")?.unwrap_or(0);
            return Ok(Command::SetColor(Rgb::clamped(r, g, b)));
        }

        if let Some(raw) = query_after(request, MESSAGE_MARKER) {
            return Ok(Command::ShowMessage(decode_message(raw)));
        }

        if request.contains(HUE_MARKER) {
            let params = QueryParams::parse(query_after(request, QUERY_MARKER).unwrap_or(""))?;
            let hue = params
                .int("hue")?
                .ok_or_else(|| ProtocolError::MalformedQuery("missing hue".to_string()))?;
            return Ok(Command::SetHue(clamp_channel(hue)));
        }

        if request.contains(DATA_MARKER) {
            return Ok(Command::FetchSensorSnapshot);
        }

        Ok(Command::Unknown)
    }
}

/// The text following the first `marker`, up to the first whitespace.
pub fn query_after<'a>(request: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = request.split_once(marker)?;
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Decode a message parameter.
///
/// Only `%20` is translated (to a space). Other escapes are left as they
/// are.
pub fn decode_message(raw: &str) -> String {
    raw.replace("%20", " ")
}

/// Key/value pairs of a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> QueryParams<'a> {
    /// Split `query` on `&`, then each segment on `=`.
    ///
    /// Every segment needs an `=`; a bare key or an empty segment is an
    /// error. For `a=b=c` the value is `b`.
    pub fn parse(query: &'a str) -> Result<Self, ProtocolError> {
        let pairs = query
            .split('&')
            .map(|segment| {
                let mut fields = segment.split('=');
                let key = fields.next().unwrap_or("");
                fields
                    .next()
                    .map(|value| (key, value))
                    .ok_or_else(|| {
                        ProtocolError::MalformedQuery(format!("segment without value: {:?}", segment))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pairs })
    }

    /// Value for `key`. The last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Integer value for `key`, or `None` if the key is absent.
    pub fn int(&self, key: &str) -> Result<Option<i64>, ProtocolError> {
        self.get(key).map(|v| parse_int(key, v)).transpose()
    }
}

/// Parse a decimal integer with an optional sign. Out of range values
/// saturate, since they clamp to a channel bound anyway.
fn parse_int(key: &str, value: &str) -> Result<i64, ProtocolError> {
    use std::num::IntErrorKind;

    value.parse::<i64>().or_else(|e| match e.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(ProtocolError::MalformedQuery(format!(
            "{} is not an integer: {:?}",
            key, value
        ))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn get(target: &str) -> String {
        format!("GET {} HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n", target)
    }

    #[test]
    fn test_set_color() {
        let cmd = Command::parse(&get("/?r=10&g=20&b=30")).unwrap();
        assert_eq!(cmd, Command::SetColor(Rgb::new(10, 20, 30)));
    }

    #[test]
    fn test_set_color_clamps() {
        let cmd = Command::parse(&get("/?r=-5&g=300&b=+7")).unwrap();
        assert_eq!(cmd, Command::SetColor(Rgb::new(0, 255, 7)));

        let cmd = Command::parse(&get("/?r=99999999999999999999999&g=0&b=-99999999999999999999"))
            .unwrap();
        assert_eq!(cmd, Command::SetColor(Rgb::new(255, 0, 0)));
    }

    #[test]
    fn test_set_color_missing_channel_defaults_to_zero() {
        // `&b=` appears in a header, not in the query.
        let request = "GET /?r=12&g=34 HTTP/1.1\r\nReferer: http://x/?a=1&b=2\r\n\r\n";
        let cmd = Command::parse(request).unwrap();
        assert_eq!(cmd, Command::SetColor(Rgb::new(12, 34, 0)));
    }

    #[test]
    fn test_set_color_malformed() {
        let err = Command::parse(&get("/?r=abc&g=1&b=2")).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedQuery(_)));

        let err = Command::parse(&get("/?r=1&g=2&b=3&flag")).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedQuery(_)));

        let err = Command::parse(&get("/?r=&g=2&b=3")).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedQuery(_)));
    }

    #[test]
    fn test_query_ends_at_whitespace() {
        let cmd = Command::parse("GET /?r=1&g=2&b=3\r\nHost: x\r\n\r\n").unwrap();
        assert_eq!(cmd, Command::SetColor(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_show_message() {
        let cmd = Command::parse(&get("/?msg=Hello%20World")).unwrap();
        assert_eq!(cmd, Command::ShowMessage("Hello World".to_string()));
    }

    #[test]
    fn test_message_only_decodes_spaces() {
        let cmd = Command::parse(&get("/?msg=50%25%20off%21")).unwrap();
        assert_eq!(cmd, Command::ShowMessage("50%25 off%21".to_string()));
    }

    #[test]
    fn test_empty_message() {
        let cmd = Command::parse(&get("/?msg=")).unwrap();
        assert_eq!(cmd, Command::ShowMessage(String::new()));
    }

    #[test]
    fn test_color_takes_priority_over_message() {
        let cmd = Command::parse(&get("/?r=1&g=2&b=3&msg=hi")).unwrap();
        assert_eq!(cmd, Command::SetColor(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_set_hue() {
        assert_eq!(Command::parse(&get("/?hue=128")).unwrap(), Command::SetHue(128));
        assert_eq!(Command::parse(&get("/?hue=400")).unwrap(), Command::SetHue(255));
        assert!(Command::parse(&get("/?hue=red")).is_err());
    }

    #[test]
    fn test_fetch_sensor_snapshot() {
        assert_eq!(
            Command::parse(&get("/data")).unwrap(),
            Command::FetchSensorSnapshot
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(Command::parse(&get("/")).unwrap(), Command::Unknown);
        assert_eq!(Command::parse(&get("/favicon.ico")).unwrap(), Command::Unknown);
        assert_eq!(Command::parse("").unwrap(), Command::Unknown);
        assert_eq!(Command::parse("garbage").unwrap(), Command::Unknown);
    }

    #[test]
    fn test_query_params() {
        let params = QueryParams::parse("r=1&g=2=3&r=4").unwrap();
        assert_eq!(params.get("r"), Some("4"));
        assert_eq!(params.get("g"), Some("2"));
        assert_eq!(params.get("b"), None);
        assert_eq!(params.int("b").unwrap(), None);
    }

    #[test]
    fn test_query_after() {
        assert_eq!(query_after("GET /?msg=a b", MESSAGE_MARKER), Some("a"));
        assert_eq!(query_after("GET /?msg=abc", MESSAGE_MARKER), Some("abc"));
        assert_eq!(query_after("GET /", MESSAGE_MARKER), None);
    }
}
