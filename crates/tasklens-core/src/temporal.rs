//! Naive timestamp parsing and temporal feature derivation.
//!
//! All timestamps are treated as naive local time: whatever clock value a
//! source wrote is taken as-is, with no timezone normalization. Sources with
//! mixed timezones will therefore produce inconsistent results; this is
//! inherited behavior, preserved deliberately.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::models::WEEKDAY_NAMES;

// ── TimestampParser ───────────────────────────────────────────────────────────

/// Parses naive timestamps from the variety of formats found in uploaded
/// sources.
pub struct TimestampParser;

impl TimestampParser {
    /// Attempt to parse a [`serde_json::Value`] into a [`NaiveDateTime`].
    ///
    /// Handles:
    /// * `null`       → `None`
    /// * JSON string  → ISO 8601-style date-times (the wall-clock part of any
    ///   offset form is kept verbatim), date-only values, and common slash
    ///   formats.
    /// * JSON number  → Unix timestamp (integer or float seconds).
    pub fn parse(value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::Null => None,
            Value::String(s) => Self::parse_str(s.as_str()),
            Value::Number(n) => {
                if let Some(secs) = n.as_i64() {
                    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
                } else if let Some(f) = n.as_f64() {
                    let secs = f.trunc() as i64;
                    let nanos = (f.fract() * 1_000_000_000.0).round() as u32;
                    chrono::DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse a timestamp string into a [`NaiveDateTime`].
    pub fn parse_str(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        // Offset forms keep their wall-clock value: `naive_local()` returns
        // the clock time exactly as written.
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }
        if let Some(stripped) = s.strip_suffix('Z') {
            if let Ok(naive) = NaiveDateTime::parse_from_str(stripped, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(naive);
            }
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M",
            "%d/%m/%Y %H:%M:%S",
            "%m/%d/%Y %H:%M:%S",
        ];
        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        // Date-only values map to midnight.
        for fmt in &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return date.and_hms_opt(0, 0, 0);
            }
        }

        warn!("TimestampParser: could not parse timestamp string \"{}\"", s);
        None
    }

    /// Parse a bare clock value (`"09:30"`, `"09:30:00"`) into a
    /// [`NaiveTime`]. Used for `start_time`/`end_time` column pairs that
    /// carry no date component.
    pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
        let s = s.trim();
        for fmt in &["%H:%M:%S%.f", "%H:%M"] {
            if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
                return Some(t);
            }
        }
        None
    }
}

// ── TemporalFeatures ──────────────────────────────────────────────────────────

/// The four calendar features derived from a start timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalFeatures {
    /// Calendar day, no time component.
    pub date: Option<NaiveDate>,
    /// Hour of day, 0–23.
    pub hour: Option<u32>,
    /// English weekday name, one of [`WEEKDAY_NAMES`].
    pub weekday_name: Option<String>,
    /// ISO-week label, e.g. `"2024-W03"`.
    pub week_period: Option<String>,
}

/// Derive all four temporal features from an (already parsed) timestamp.
///
/// A null timestamp yields all-null features — such records stay in the
/// dataset but drop out of temporal aggregations.
pub fn derive_features(ts: Option<NaiveDateTime>) -> TemporalFeatures {
    let Some(ts) = ts else {
        return TemporalFeatures::default();
    };

    let iso = ts.iso_week();
    TemporalFeatures {
        date: Some(ts.date()),
        hour: Some(ts.hour()),
        weekday_name: Some(
            WEEKDAY_NAMES[ts.weekday().num_days_from_monday() as usize].to_string(),
        ),
        week_period: Some(format!("{}-W{:02}", iso.year(), iso.week())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
