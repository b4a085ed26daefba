//! Whitespace-separated `key value` logs with an optional leading timestamp.

use regex::Regex;
use std::sync::OnceLock;
use traffic_core::data_processors::TimestampProcessor;
use traffic_core::models::{canonical_field_name, fields, FieldValue, Record};

use super::DetectorError;

/// Number of leading lines inspected for header-like tokens.
pub const HEADER_SCAN_LINES: usize = 10;

fn identifier_regex() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("regex is valid"))
}

/// Parse `lines` as alternating key/value tokens.
///
/// The first two tokens of each line are tried jointly as a date-time and
/// consumed when they parse, which can swallow a pair whose key and value
/// happen to read as a date.
pub fn parse(lines: &[&str]) -> Result<Vec<Record>, DetectorError> {
    let scanned = lines.len().min(HEADER_SCAN_LINES);
    let has_candidates = lines[..scanned]
        .iter()
        .flat_map(|line| line.split_whitespace())
        .any(|token| identifier_regex().is_match(token));
    if !has_candidates {
        return Err(DetectorError::NoHeaderCandidates(scanned));
    }

    Ok(lines.iter().filter_map(|line| parse_line(line)).collect())
}

fn parse_line(line: &str) -> Option<Record> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    let mut record = Record::new();

    let lead = tokens.len().min(2);
    if lead > 0 {
        if let Some(ts) = TimestampProcessor::parse(&tokens[..lead].join(" ")) {
            record.insert(fields::TIMESTAMP, FieldValue::Timestamp(ts));
            tokens.drain(..lead);
        }
    }

    for pair in tokens.chunks_exact(2) {
        let key = canonical_field_name(pair[0]);
        let key = key.trim_matches(':');
        if key.is_empty() {
            continue;
        }
        record.insert(key, FieldValue::text(pair[1]));
    }

    (!record.is_empty()).then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_after_timestamp() {
        let records = parse(&["2023-10-05 08:23:45 src: 10.0.0.1 dst: 10.0.0.2 bytes 500"]).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert!(r.timestamp().is_some());
        assert_eq!(r.text("src"), Some("10.0.0.1"));
        assert_eq!(r.text("dst"), Some("10.0.0.2"));
        assert_eq!(r.text("bytes"), Some("500"));
    }

    #[test]
    fn test_without_timestamp_all_tokens_pair() {
        let records = parse(&["Src-Port 80 proto TCP"]).unwrap();
        assert_eq!(records[0].text("src_port"), Some("80"));
        assert_eq!(records[0].text("proto"), Some("TCP"));
        assert!(records[0].timestamp().is_none());
    }

    #[test]
    fn test_odd_trailing_token_dropped() {
        let records = parse(&["a 1 b 2 dangling"]).unwrap();
        assert_eq!(records[0].len(), 2);
        assert!(!records[0].contains("dangling"));
    }

    #[test]
    fn test_single_token_line_contributes_nothing() {
        let records = parse(&["header", "a 1"]).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_no_identifier_tokens_fails() {
        let err = parse(&["!!! ??? 123"]).unwrap_err();
        assert!(matches!(err, DetectorError::NoHeaderCandidates(1)));
    }

    #[test]
    fn test_candidates_only_scanned_in_leading_lines() {
        let mut lines = vec!["1 2"; HEADER_SCAN_LINES];
        lines.push("key value");
        assert!(parse(&lines).is_err());
    }
}
