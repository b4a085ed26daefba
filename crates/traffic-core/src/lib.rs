//! Shared types for the traffic analyzer: the normalized record model, the
//! best-effort coercion primitives, calendar helpers, formatting, error types
//! and CLI settings.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, TrafficError};
