//! Diagnostics hooks for the parsing pipeline.

use tracing::{debug, info, warn};

use crate::detectors::{DetectorError, LogFormat};

/// A field value that could not be converted to its canonical type.
///
/// The record keeps the field with a null value; this only reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionFailure {
    /// Position of the record in parse order.
    pub record_index: usize,
    pub field: String,
    pub raw: String,
}

/// Receives pipeline diagnostics. Every hook defaults to a no-op.
pub trait ParseObserver {
    fn detector_failed(&self, _format: LogFormat, _error: &DetectorError) {}

    fn detector_succeeded(&self, _format: LogFormat, _records: usize) {}

    fn coercion_failed(&self, _failure: &CoercionFailure) {}
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ParseObserver for TracingObserver {
    fn detector_failed(&self, format: LogFormat, error: &DetectorError) {
        debug!("{} detector rejected input: {}", format, error);
    }

    fn detector_succeeded(&self, format: LogFormat, records: usize) {
        info!("Parsed {} records as {} log", records, format);
    }

    fn coercion_failed(&self, failure: &CoercionFailure) {
        warn!(
            record = failure.record_index,
            field = %failure.field,
            "Could not convert {:?}; stored as null",
            failure.raw
        );
    }
}

/// Discards all diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl ParseObserver for SilentObserver {}
