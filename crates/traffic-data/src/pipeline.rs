//! Raw log text → normalized [`RecordSet`].
//!
//! The cascade runs the detectors in [`LogFormat::CASCADE`] order on the
//! significant lines of the input and normalizes the first non-empty result.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};
use traffic_core::models::RecordSet;
use traffic_core::{Result, TrafficError};

use crate::detectors::LogFormat;
use crate::lines::significant_lines;
use crate::normalizer::normalize;
use crate::observer::{CoercionFailure, ParseObserver, TracingObserver};

// ── Public API ────────────────────────────────────────────────────────────────

/// A successfully parsed log.
#[derive(Debug, Serialize)]
pub struct ParseOutcome {
    pub format: LogFormat,
    pub records: RecordSet,
    /// Non-blank, non-comment lines handed to the detectors.
    pub lines_considered: usize,
    #[serde(skip)]
    pub coercion_failures: Vec<CoercionFailure>,
}

impl ParseOutcome {
    pub fn coercion_failure_count(&self) -> usize {
        self.coercion_failures.len()
    }
}

/// Parse `content`, reporting diagnostics through `tracing`.
pub fn parse_log_content(content: &str) -> Result<ParseOutcome> {
    parse_log_content_with(content, &TracingObserver)
}

/// Parse `content`, reporting diagnostics to `observer`.
///
/// Fails with [`TrafficError::NoData`] when nothing but blank or comment lines
/// remain and with [`TrafficError::ParseFailure`] when every detector rejects
/// the input.
pub fn parse_log_content_with(content: &str, observer: &dyn ParseObserver) -> Result<ParseOutcome> {
    let lines = significant_lines(content);
    if lines.is_empty() {
        return Err(TrafficError::NoData);
    }
    debug!("Running format detection over {} lines", lines.len());

    for format in LogFormat::CASCADE {
        match format.attempt(&lines) {
            Ok(raw) => {
                observer.detector_succeeded(format, raw.len());
                let normalized = normalize(raw, observer);
                return Ok(ParseOutcome {
                    format,
                    records: RecordSet::from_records(normalized.records),
                    lines_considered: lines.len(),
                    coercion_failures: normalized.coercion_failures,
                });
            }
            Err(e) => observer.detector_failed(format, &e),
        }
    }

    Err(TrafficError::ParseFailure)
}

/// Read `path` and parse its contents.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn load_log_file(path: &Path) -> Result<ParseOutcome> {
    let bytes = std::fs::read(path).map_err(|source| TrafficError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            warn!("{} is not valid UTF-8; replacing invalid bytes", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    parse_log_content(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use traffic_core::models::FieldValue;

    const SAMPLE_KV: &str = "2023-10-05 08:23:45 src-ip=192.168.1.10 dst-ip=203.0.113.5 protocol=TCP src-port=54321 dst-port=443 bytes=1240";

    #[test]
    fn test_key_value_sample_line() {
        let outcome = parse_log_content(SAMPLE_KV).unwrap();
        assert_eq!(outcome.format, LogFormat::KeyValue);
        assert_eq!(outcome.records.len(), 1);
        let r = &outcome.records.records()[0];
        assert_eq!(
            r.timestamp().map(|t| t.to_string()),
            Some("2023-10-05 08:23:45".to_string())
        );
        assert_eq!(r.text("src_ip"), Some("192.168.1.10"));
        assert_eq!(r.text("dst_ip"), Some("203.0.113.5"));
        assert_eq!(r.text("protocol"), Some("TCP"));
        assert_eq!(r.get("src_port"), Some(&FieldValue::Integer(54321)));
        assert_eq!(r.get("dst_port"), Some(&FieldValue::Integer(443)));
        assert_eq!(r.get("bytes"), Some(&FieldValue::Integer(1240)));
    }

    #[test]
    fn test_csv_input() {
        let content = "timestamp,src_ip,bytes\n2023-10-05 08:00:00,10.0.0.1,1000\n2023-10-05 09:00:00,10.0.0.2,2048\n";
        let outcome = parse_log_content(content).unwrap();
        assert_eq!(outcome.format, LogFormat::Delimited);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records.columns(), &["timestamp", "src_ip", "bytes"]);
    }

    #[test]
    fn test_csv_synonyms_never_coexist() {
        let content = "Source_IP,src_ip,bytes\n10.0.0.1,,5\n10.0.0.2,10.0.0.3,6\n";
        let outcome = parse_log_content(content).unwrap();
        for r in &outcome.records {
            assert!(!r.contains("source_ip"));
        }
        assert!(!outcome.records.has_column("source_ip"));
        assert_eq!(outcome.records.records()[0].text("src_ip"), Some("10.0.0.1"));
        assert_eq!(outcome.records.records()[1].text("src_ip"), Some("10.0.0.3"));
    }

    #[test]
    fn test_empty_and_comment_only_is_no_data() {
        assert!(matches!(parse_log_content(""), Err(TrafficError::NoData)));
        assert!(matches!(
            parse_log_content("\n   \n# header comment\n"),
            Err(TrafficError::NoData)
        ));
    }

    #[test]
    fn test_garbage_is_parse_failure() {
        let observer = RecordingObserver::default();
        let err = parse_log_content_with("!!! ??? 123", &observer).unwrap_err();
        assert!(matches!(err, TrafficError::ParseFailure));
        assert_eq!(*observer.failed.borrow(), LogFormat::CASCADE.to_vec());
    }

    #[test]
    fn test_first_successful_detector_stops_cascade() {
        let observer = RecordingObserver::default();
        parse_log_content_with(SAMPLE_KV, &observer).unwrap();
        assert_eq!(*observer.failed.borrow(), vec![LogFormat::Delimited]);
        assert_eq!(*observer.succeeded.borrow(), vec![(LogFormat::KeyValue, 1)]);
    }

    #[test]
    fn test_bad_bytes_retained_as_null() {
        let outcome = parse_log_content("src_ip=10.0.0.1 bytes=not_a_number\nsrc_ip=10.0.0.2 bytes=10").unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert!(!outcome.records.records()[0].has_value("bytes"));
        assert_eq!(outcome.coercion_failure_count(), 1);
    }

    #[test]
    fn test_whitespace_columnar_fallback() {
        let content = "# flow export\n2023/10/05 08:23:45 src 10.0.0.1 dst 10.0.0.2 bytes 500\n";
        let outcome = parse_log_content(content).unwrap();
        assert_eq!(outcome.format, LogFormat::Columnar);
        assert_eq!(outcome.lines_considered, 1);
        assert_eq!(outcome.records.records()[0].get("bytes"), Some(&FieldValue::Integer(500)));
    }

    #[test]
    fn test_reparsing_serialized_key_value_is_idempotent() {
        let first = parse_log_content(SAMPLE_KV).unwrap();
        let r = &first.records.records()[0];
        let line: Vec<String> = r
            .fields()
            .map(|(k, v)| match v.as_timestamp() {
                Some(ts) => format!("{}={}", k, ts.format("%Y-%m-%dT%H:%M:%S")),
                None => format!("{}={}", k, v),
            })
            .collect();
        let second = parse_log_content(&line.join(" ")).unwrap();
        assert_eq!(second.records.records()[0], *r);
    }

    #[test]
    fn test_key_value_time_key_kept_as_text() {
        let outcome = parse_log_content("src_ip=10.0.0.1 time=12s bytes=5\nsrc_ip=10.0.0.2 bytes=7").unwrap();
        assert_eq!(outcome.format, LogFormat::KeyValue);
        assert_eq!(outcome.records.columns(), &["src_ip", "time", "bytes"]);
        assert_eq!(outcome.records.records()[0].text("time"), Some("12s"));
        assert_eq!(outcome.coercion_failure_count(), 0);

        let filter = traffic_core::models::FilterState {
            start_date: chrono::NaiveDate::from_ymd_opt(2000, 1, 1),
            ..Default::default()
        };
        assert_eq!(crate::filter::apply_filter(&outcome.records, &filter).len(), 2);
    }

    #[test]
    fn test_columnar_time_key_kept_as_text() {
        let outcome = parse_log_content("host r1 time 5ms bytes 10").unwrap();
        assert_eq!(outcome.format, LogFormat::Columnar);
        let r = &outcome.records.records()[0];
        assert_eq!(r.text("time"), Some("5ms"));
        assert!(!r.contains("timestamp"));
        assert_eq!(r.get("bytes"), Some(&FieldValue::Integer(10)));
        assert_eq!(outcome.coercion_failure_count(), 0);
    }

    #[test]
    fn test_key_value_unparseable_timestamp_key_is_null() {
        let outcome = parse_log_content("timestamp=soon src_ip=10.0.0.1").unwrap();
        let r = &outcome.records.records()[0];
        assert!(r.contains("timestamp"));
        assert!(!r.has_value("timestamp"));
        assert_eq!(r.text("src_ip"), Some("10.0.0.1"));
        assert_eq!(outcome.coercion_failure_count(), 1);
    }

    #[test]
    fn test_load_log_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", SAMPLE_KV).unwrap();
        let outcome = load_log_file(file.path()).unwrap();
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_load_log_file_missing() {
        let err = load_log_file(Path::new("/nonexistent/traffic.log")).unwrap_err();
        assert!(matches!(err, TrafficError::FileRead { .. }));
    }

    #[test]
    fn test_load_log_file_lossy_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"src=10.0.0.1 note=caf\xe9 bytes=3\n").unwrap();
        let outcome = load_log_file(file.path()).unwrap();
        assert_eq!(outcome.records.len(), 1);
    }
}
