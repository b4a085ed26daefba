use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, TrafficError};
use crate::models::{FilterState, Interval};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Traffic analysis for router log exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "traffic-lens",
    about = "Traffic analysis for router log exports",
    version
)]
pub struct Settings {
    /// Log file to analyse (.txt, .log or .csv; the format is sniffed)
    pub input: PathBuf,

    /// Only keep records on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Only keep records on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Only keep records whose source or destination IP contains this text
    #[arg(long)]
    pub ip: Option<String>,

    /// Only keep records with exactly this protocol
    #[arg(long)]
    pub protocol: Option<String>,

    /// Bucket width for the time series
    #[arg(long, default_value = "hourly", value_parser = ["hourly", "daily", "weekly"])]
    pub interval: String,

    /// Number of entries in the chart series (top IPs, ports, pairs)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top_n: u32,

    /// Report format written to stdout
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub output: String,

    /// Write the filtered records to this path (.csv or .json)
    #[arg(long)]
    pub export_records: Option<PathBuf>,

    /// Write the statistics summary table (CSV) to this path
    #[arg(long)]
    pub export_summary: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Also append log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved preferences
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Display preferences persisted to `~/.traffic-lens/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl LastUsedParams {
    /// Default location of the preferences file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Preferences path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".traffic-lens").join("last_used.json")
    }

    /// Load preferences; a missing or unreadable file yields the defaults.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Write preferences via a temp file and rename.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the preferences file at `path` if present.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and merge saved preferences for any display option
    /// not given explicitly, then persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// preferences path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug_flag(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; filters and export paths are never persisted.
        if !is_arg_explicitly_set(&matches, "interval") {
            if let Some(v) = last.interval {
                settings.interval = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "top_n") {
            if let Some(v) = last.top_n {
                settings.top_n = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "output") {
            if let Some(v) = last.output {
                settings.output = v;
            }
        }

        settings = Self::apply_debug_flag(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("could not persist preferences to {}: {}", config_path.display(), e);
        }

        settings
    }

    /// The filter described by the CLI flags.
    ///
    /// Fails when the date range is inverted.
    pub fn filter_state(&self) -> Result<FilterState> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(TrafficError::Config(format!(
                    "end date {end} precedes start date {start}"
                )));
            }
        }
        Ok(FilterState {
            start_date: self.start_date,
            end_date: self.end_date,
            ip_substring: self.ip.clone().filter(|s| !s.is_empty()),
            protocol_equals: self.protocol.clone(),
        })
    }

    /// The resampling interval; falls back to hourly for unknown persisted values.
    pub fn interval(&self) -> Interval {
        self.interval.parse().unwrap_or(Interval::Hourly)
    }

    fn apply_debug_flag(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            interval: Some(s.interval.clone()),
            top_n: Some(s.top_n),
            output: Some(s.output.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied on the command line rather than
/// coming from a default.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
