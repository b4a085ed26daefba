//! `key=value` logs such as MikroTik firewall and traffic-flow output.

use regex::Regex;
use std::sync::OnceLock;
use traffic_core::data_processors::TimestampProcessor;
use traffic_core::models::{canonical_field_name, fields, FieldValue, Record};

/// Embedded timestamp patterns, tried in order; the first that matches wins.
const TIMESTAMP_PATTERNS: [(&str, &str); 3] = [
    (r"\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}", "%Y-%m-%d %H:%M:%S"),
    (r"[A-Za-z]{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}", "%b %d %H:%M:%S"),
    (r"\d{1,2}/\d{1,2}/\d{4}\s+\d{2}:\d{2}:\d{2}", "%m/%d/%Y %H:%M:%S"),
];

fn timestamp_regexes() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        TIMESTAMP_PATTERNS
            .iter()
            .map(|(pattern, fmt)| (Regex::new(pattern).expect("regex is valid"), *fmt))
            .collect()
    })
}

fn pair_regex() -> &'static Regex {
    static PAIR: OnceLock<Regex> = OnceLock::new();
    PAIR.get_or_init(|| {
        Regex::new(r#"([a-zA-Z0-9_-]+)=([^"\s]+|"[^"]*")"#).expect("regex is valid")
    })
}

/// Extract one record per line that yields a timestamp or at least one pair.
///
/// Never fails on its own; an empty result means the grammar did not apply.
pub fn parse(lines: &[&str]) -> Vec<Record> {
    lines.iter().filter_map(|line| parse_line(line)).collect()
}

/// Parse a single line, or `None` when it carries nothing recognisable.
pub fn parse_line(line: &str) -> Option<Record> {
    let mut record = Record::new();

    if let Some(ts) = extract_timestamp(line) {
        record.insert(fields::TIMESTAMP, FieldValue::Timestamp(ts));
    }

    for caps in pair_regex().captures_iter(line) {
        let key = canonical_field_name(&caps[1]);
        let raw = &caps[2];
        let value = raw
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(raw);
        record.insert(key, FieldValue::text(value));
    }

    (!record.is_empty()).then_some(record)
}

/// Search `line` for an embedded timestamp.
///
/// Only the first pattern that matches is considered; if its text does not
/// parse the line has no timestamp.
pub fn extract_timestamp(line: &str) -> Option<chrono::NaiveDateTime> {
    let (regex, fmt) = timestamp_regexes()
        .iter()
        .find(|(regex, _)| regex.is_match(line))?;
    let matched = regex.find(line)?.as_str();
    let collapsed = matched.split_whitespace().collect::<Vec<_>>().join(" ");
    TimestampProcessor::parse_with_format(&collapsed, fmt)
}
