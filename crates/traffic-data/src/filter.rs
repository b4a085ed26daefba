//! Applying a [`FilterState`] to a record set.

use chrono::{NaiveDateTime, NaiveTime};
use traffic_core::models::{fields, FilterState, Record, RecordSet};

/// Records of `set` that satisfy every active criterion of `filter`.
///
/// Date bounds cover whole days. A criterion whose field is not part of the
/// schema is ignored. The source set is left untouched.
pub fn apply_filter(set: &RecordSet, filter: &FilterState) -> RecordSet {
    if filter.is_empty() {
        return set.clone();
    }

    let use_dates = set.has_column(fields::TIMESTAMP)
        && (filter.start_date.is_some() || filter.end_date.is_some());
    let start = filter.start_date.map(|d| d.and_time(NaiveTime::MIN));
    let end = filter
        .end_date
        .and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_999));

    let ip = filter
        .ip_substring
        .as_deref()
        .filter(|s| !s.is_empty())
        .filter(|_| set.has_column(fields::SRC_IP) || set.has_column(fields::DST_IP));

    let protocol = filter
        .protocol_equals
        .as_deref()
        .filter(|_| set.has_column(fields::PROTOCOL));

    let kept = set
        .iter()
        .filter(|r| !use_dates || within(r.timestamp(), start, end))
        .filter(|r| ip.map_or(true, |needle| matches_ip(r, needle)))
        .filter(|r| protocol.map_or(true, |p| r.text(fields::PROTOCOL) == Some(p)))
        .cloned()
        .collect();

    set.with_records(kept)
}

fn within(ts: Option<NaiveDateTime>, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> bool {
    let Some(ts) = ts else {
        return false;
    };
    start.map_or(true, |s| ts >= s) && end.map_or(true, |e| ts <= e)
}

fn matches_ip(record: &Record, needle: &str) -> bool {
    [fields::SRC_IP, fields::DST_IP]
        .iter()
        .any(|f| record.text(f).is_some_and(|ip| ip.contains(needle)))
}

/// Distinct protocol names in `set`, sorted.
pub fn protocols(set: &RecordSet) -> Vec<String> {
    let mut names: Vec<String> = set
        .iter()
        .filter_map(|r| r.text(fields::PROTOCOL))
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    names
}
