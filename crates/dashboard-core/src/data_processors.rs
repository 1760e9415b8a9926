use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

// ── DateProcessor ─────────────────────────────────────────────────────────────

/// Spreadsheet serial day 0. Serial 1 is nominally 1900-01-01 but the
/// 1900 leap-year bug shifts every modern serial by one day, so counting
/// from the 30th gives correct dates for anything after February 1900.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Parses the date shapes found in exported experiment sheets.
pub struct DateProcessor;

impl DateProcessor {
    /// Attempt to parse a [`serde_json::Value`] into a calendar date.
    ///
    /// Handles:
    /// * `null`       → `None`
    /// * JSON number  → spreadsheet serial day (fraction = time of day, ignored)
    /// * JSON string  → ISO 8601 / RFC 3339, `M/D/YYYY`, or a serial in text form
    pub fn parse(value: &Value) -> Option<NaiveDate> {
        match value {
            Value::Number(n) => n.as_f64().and_then(Self::from_serial),
            Value::String(s) => Self::parse_str(s.trim()),
            _ => None,
        }
    }

    /// Convert a spreadsheet serial day number to a date.
    pub fn from_serial(serial: f64) -> Option<NaiveDate> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }
        let (y, m, d) = SERIAL_EPOCH;
        NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.floor() as u64))
    }

    /// `"YYYY-MM"` key for the month containing `date`.
    pub fn month_key(date: NaiveDate) -> String {
        format!("{:04}-{:02}", date.year(), date.month())
    }

    fn parse_str(s: &str) -> Option<NaiveDate> {
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }

        const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
        const DATETIME_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%m/%d/%Y %H:%M:%S",
            "%m/%d/%Y, %H:%M:%S",
        ];

        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return Some(date);
            }
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive.date());
            }
        }

        // Serial numbers sometimes survive as text.
        if let Ok(serial) = s.parse::<f64>() {
            return Self::from_serial(serial);
        }

        debug!("DateProcessor: could not parse date string \"{}\"", s);
        None
    }
}

// ── ValueCoercion ─────────────────────────────────────────────────────────────

/// Lenient scalar coercions for untrusted spreadsheet cells.
pub struct ValueCoercion;

impl ValueCoercion {
    /// A finite JSON number, otherwise `0.0`.
    ///
    /// Strings are deliberately not parsed: a textual cell in a numeric column
    /// ("n/a", "pending") counts as missing.
    pub fn measure(value: Option<&Value>) -> f64 {
        match value {
            Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// A trimmed, non-empty label. Numbers and booleans are stringified.
    pub fn label(value: Option<&Value>) -> Option<String> {
        let text = match value? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
