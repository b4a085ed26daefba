use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the traffic analyzer.
#[derive(Error, Debug)]
pub enum TrafficError {
    /// The input held no lines once blank and comment lines were removed.
    #[error("No valid data found in the log content")]
    NoData,

    /// None of the format detectors produced a single record.
    #[error("Could not determine the log format")]
    ParseFailure,

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record set or statistics bundle could not be serialized to JSON.
    #[error("Failed to serialize JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Writing delimited output failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the traffic crates.
pub type Result<T> = std::result::Result<T, TrafficError>;
