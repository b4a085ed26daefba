use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical field names shared by the parsers and the aggregation engine.
pub mod fields {
    pub const TIMESTAMP: &str = "timestamp";
    pub const TIME: &str = "time";
    pub const SRC_IP: &str = "src_ip";
    pub const DST_IP: &str = "dst_ip";
    pub const PROTOCOL: &str = "protocol";
    pub const SRC_PORT: &str = "src_port";
    pub const DST_PORT: &str = "dst_port";
    pub const BYTES: &str = "bytes";

    /// Synonym column → canonical column.
    pub const SYNONYMS: &[(&str, &str)] = &[
        ("source_ip", SRC_IP),
        ("destination_ip", DST_IP),
        ("source_port", SRC_PORT),
        ("destination_port", DST_PORT),
    ];

    /// Columns that hold port numbers, including their synonyms.
    pub const PORT_COLUMNS: &[&str] = &[SRC_PORT, DST_PORT, "source_port", "destination_port"];
}

/// Lower-case a column name and replace hyphens with underscores.
///
/// ```
/// use traffic_core::models::canonical_field_name;
///
/// assert_eq!(canonical_field_name("Src-IP"), "src_ip");
/// assert_eq!(canonical_field_name("bytes"), "bytes");
/// ```
pub fn canonical_field_name(raw: &str) -> String {
    raw.trim().to_lowercase().replace('-', "_")
}

// ── FieldValue ────────────────────────────────────────────────────────────────

/// A single typed value inside a [`Record`].
///
/// `Null` marks a value that was present in the source but failed coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Null,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Borrow the string payload of a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of `Integer` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view; floats qualify only when they carry no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Render the value for tabular output. `Null` renders as `None`.
    pub fn to_display_string(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(n) => Some(n.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            FieldValue::Null => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_display_string() {
            Some(s) => f.write_str(&s),
            None => f.write_str("null"),
        }
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One normalized log entry: canonical field name → typed value.
///
/// Field order follows insertion order so exports keep the source layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let idx = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(idx).1)
    }

    /// Rename `from` to `to` in place, keeping the field's position.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k == from) {
            slot.0 = to.to_string();
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// `true` when `key` is present and not null.
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_i64)
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.get(fields::TIMESTAMP)
            .and_then(FieldValue::as_timestamp)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

// ── RecordSet ─────────────────────────────────────────────────────────────────

/// Ordered records sharing a (possibly partial) schema.
///
/// `columns` lists every field name seen in any record, in first-seen order.
/// Filtering produces a new set with the same columns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordSet {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    /// Build a set, deriving the schema from the records themselves.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }
        Self { columns, records }
    }

    /// A derived set that keeps this set's schema.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            columns: self.columns.clone(),
            records,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ── FilterState ───────────────────────────────────────────────────────────────

/// User-selected view over a record set. Every criterion is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// First day included (from 00:00:00).
    pub start_date: Option<NaiveDate>,
    /// Last day included (through 23:59:59).
    pub end_date: Option<NaiveDate>,
    /// Plain substring matched against `src_ip` or `dst_ip`.
    pub ip_substring: Option<String>,
    /// Exact protocol name.
    pub protocol_equals: Option<String>,
}

impl FilterState {
    /// `true` when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.ip_substring.as_deref().map_or(true, str::is_empty)
            && self.protocol_equals.is_none()
    }
}

// ── Interval ──────────────────────────────────────────────────────────────────

/// Width of a resampling bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Hourly,
    Daily,
    Weekly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Hourly => "hourly",
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = crate::error::TrafficError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hourly" | "hour" | "h" => Ok(Interval::Hourly),
            "daily" | "day" | "d" => Ok(Interval::Daily),
            "weekly" | "week" | "w" => Ok(Interval::Weekly),
            other => Err(crate::error::TrafficError::Config(format!(
                "unknown interval: {other}"
            ))),
        }
    }
}
