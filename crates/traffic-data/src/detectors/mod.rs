//! Log-format detectors.
//!
//! Each detector tries to turn the filtered input lines into records. The
//! pipeline runs them in [`LogFormat::CASCADE`] order and keeps the first
//! result with at least one record; a failing detector never yields partial
//! output.

pub mod columnar;
pub mod delimited;
pub mod key_value;

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use traffic_core::models::Record;

/// Why a single detector rejected the input.
#[derive(Error, Debug)]
pub enum DetectorError {
    /// The delimited reader hit a malformed row or inconsistent field count.
    #[error("malformed delimited table: {0}")]
    Malformed(#[from] csv::Error),

    /// The header row does not describe a table.
    #[error("header has {0} column(s); at least two are required")]
    NarrowHeader(usize),

    /// A header cell carries a `key=value` token, so the first line is data.
    #[error("header cell {0:?} looks like key=value data")]
    DataInHeader(String),

    /// No bare-identifier tokens appeared in the leading lines.
    #[error("no candidate header names in the first {0} lines")]
    NoHeaderCandidates(usize),

    /// The grammar matched nothing usable.
    #[error("no records produced")]
    NoRecords,
}

/// The supported input grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Comma-delimited table with a header row.
    Delimited,
    /// `key=value` tokens with an optional embedded timestamp.
    KeyValue,
    /// Whitespace-separated `key value` pairs after an optional timestamp.
    Columnar,
}

impl LogFormat {
    /// Detection priority, highest first.
    pub const CASCADE: [LogFormat; 3] = [LogFormat::Delimited, LogFormat::KeyValue, LogFormat::Columnar];

    pub fn name(&self) -> &'static str {
        match self {
            LogFormat::Delimited => "delimited",
            LogFormat::KeyValue => "key-value",
            LogFormat::Columnar => "whitespace-columnar",
        }
    }

    /// Run this detector over `lines`.
    pub fn attempt(&self, lines: &[&str]) -> Result<Vec<Record>, DetectorError> {
        let records = match self {
            LogFormat::Delimited => delimited::parse(lines)?,
            LogFormat::KeyValue => key_value::parse(lines),
            LogFormat::Columnar => columnar::parse(lines)?,
        };
        if records.is_empty() {
            return Err(DetectorError::NoRecords);
        }
        Ok(records)
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
