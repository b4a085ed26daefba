use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::FieldValue;

/// Year assigned to syslog-style timestamps that carry no year of their own.
pub const DEFAULT_YEAR: i32 = 1900;

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses timestamps from the variety of formats found in router log exports.
///
/// All results are naive date-times: router logs record wall-clock time and
/// the analyzer never needs to relate it to another zone.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Best-effort parse of a free-form timestamp string.
    ///
    /// Handles RFC 3339 (offsets are folded into UTC), ISO 8601 with `T` or
    /// space separators, slash-separated US dates and date-only values.
    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.naive_utc());
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y/%m/%d %H:%M:%S",
            "%m/%d/%Y %H:%M:%S",
            "%b %d %Y %H:%M:%S",
        ];
        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return date.and_hms_opt(0, 0, 0);
            }
        }

        None
    }

    /// Parse `s` with one explicit strftime format.
    ///
    /// Formats without a `%Y` component are completed with [`DEFAULT_YEAR`].
    pub fn parse_with_format(s: &str, fmt: &str) -> Option<NaiveDateTime> {
        if fmt.contains("%Y") {
            return NaiveDateTime::parse_from_str(s.trim(), fmt).ok();
        }
        let with_year = format!("{} {}", DEFAULT_YEAR, s.trim());
        let fmt_with_year = format!("%Y {}", fmt);
        NaiveDateTime::parse_from_str(&with_year, &fmt_with_year).ok()
    }
}

// ── Numeric coercion ──────────────────────────────────────────────────────────

/// Parse `s` as an integer when possible, otherwise as a finite float.
pub fn parse_number(s: &str) -> Option<FieldValue> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(FieldValue::Integer(n));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(FieldValue::Float)
}

/// Parse `s` as an integer; whole-valued floats such as `"443.0"` qualify.
pub fn parse_integer(s: &str) -> Option<i64> {
    parse_number(s).and_then(|v| v.as_i64())
}

// ── Coercion ──────────────────────────────────────────────────────────────────

/// Target type of a best-effort field conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Timestamp,
    Number,
    Integer,
}

impl Coercion {
    /// Convert `value` to the target type.
    ///
    /// Values that already have the target type pass through unchanged and
    /// `Null` stays `Null`. Returns `None` when the conversion fails; callers
    /// store `FieldValue::Null` in that case rather than dropping the record.
    pub fn apply(&self, value: &FieldValue) -> Option<FieldValue> {
        match (self, value) {
            (_, FieldValue::Null) => Some(FieldValue::Null),
            (Coercion::Timestamp, FieldValue::Timestamp(_)) => Some(value.clone()),
            (Coercion::Timestamp, FieldValue::Text(s)) => {
                TimestampProcessor::parse(s).map(FieldValue::Timestamp)
            }
            (Coercion::Number, FieldValue::Integer(_) | FieldValue::Float(_)) => {
                Some(value.clone())
            }
            (Coercion::Number, FieldValue::Text(s)) => parse_number(s),
            (Coercion::Integer, FieldValue::Text(s)) => parse_integer(s).map(FieldValue::Integer),
            (Coercion::Integer, FieldValue::Integer(_) | FieldValue::Float(_)) => {
                value.as_i64().map(FieldValue::Integer)
            }
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
