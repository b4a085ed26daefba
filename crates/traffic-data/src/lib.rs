//! Ingestion and analysis layer for traffic-lens.
//!
//! Turns raw router log text into a normalized [`RecordSet`](traffic_core::models::RecordSet)
//! through a cascade of format detectors, then filters, aggregates, resamples
//! and exports it.

pub mod aggregator;
pub mod charts;
pub mod detectors;
pub mod export;
pub mod filter;
pub mod lines;
pub mod normalizer;
pub mod observer;
pub mod pipeline;
pub mod ranking;
pub mod resample;

pub use traffic_core as core;

pub use pipeline::{load_log_file, parse_log_content, parse_log_content_with, ParseOutcome};
