//! Summary statistics over a (filtered) record set.
//!
//! Every statistic depends on certain fields being part of the schema. When a
//! field is missing the statistic is left out and listed in
//! [`SummaryStatistics::skipped`]; aggregation itself never fails.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use traffic_core::formatting::{bytes_to_gb, bytes_to_mb};
use traffic_core::models::{fields, FieldValue, Record, RecordSet};
use traffic_core::time_utils::{duration_hours, weekday_index, DAY_NAMES};

use crate::ranking::{GroupTally, GroupValue};

/// Default length of the top-N rankings.
pub const TOP_N: usize = 10;

// ── Bundle types ──────────────────────────────────────────────────────────────

/// Byte totals. `avg_bytes_per_record` averages over records whose `bytes`
/// value is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficTotals {
    pub total_bytes: f64,
    pub total_mb: f64,
    pub total_gb: f64,
    pub avg_bytes_per_record: Option<f64>,
}

/// Statistics for one side of a connection (`src_ip` or `dst_ip`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStats {
    pub unique: usize,
    pub top_by_count: Vec<GroupValue<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_by_traffic: Option<Vec<GroupValue<String, f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timespan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_hours: f64,
}

/// A statistic left out because its input field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStatistic {
    pub statistic: &'static str,
    pub missing_field: &'static str,
}

/// Everything derived from one record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic: Option<TrafficTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<EndpointStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destinations: Option<EndpointStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_distribution: Option<Vec<GroupValue<String, u64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timespan: Option<Timespan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_by_hour: Option<Vec<GroupValue<u32, f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections_by_hour: Option<Vec<GroupValue<u32, u64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_by_day: Option<Vec<GroupValue<&'static str, f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections_by_day: Option<Vec<GroupValue<&'static str, u64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_destination_ports: Option<Vec<GroupValue<i64, u64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_ports_by_traffic: Option<Vec<GroupValue<i64, f64>>>,
    pub skipped: Vec<SkippedStatistic>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Grouping key for a text-like field; null and absent values yield `None`.
pub(crate) fn group_key(record: &Record, field: &str) -> Option<String> {
    record.get(field).and_then(FieldValue::to_display_string)
}

fn bytes_of(record: &Record) -> Option<f64> {
    record.number(fields::BYTES)
}

fn endpoint_stats(set: &RecordSet, field: &str, with_bytes: bool, top_n: usize) -> EndpointStats {
    let mut tally = GroupTally::new();
    for record in set {
        if let Some(key) = group_key(record, field) {
            tally.add(&key, bytes_of(record));
        }
    }
    EndpointStats {
        unique: tally.unique(),
        top_by_count: tally.by_count(top_n),
        top_by_traffic: with_bytes.then(|| tally.by_sum(top_n)),
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// [`compute_summary_top`] with [`TOP_N`].
pub fn compute_summary(set: &RecordSet) -> SummaryStatistics {
    compute_summary_top(set, TOP_N)
}

/// Compute the summary bundle with rankings truncated to `top_n` entries.
pub fn compute_summary_top(set: &RecordSet, top_n: usize) -> SummaryStatistics {
    let has_bytes = set.has_column(fields::BYTES);
    let has_timestamp = set.has_column(fields::TIMESTAMP);
    let mut skipped = Vec::new();
    let mut skip = |statistic: &'static str, missing_field: &'static str| {
        skipped.push(SkippedStatistic {
            statistic,
            missing_field,
        });
    };

    let traffic = if has_bytes {
        let values: Vec<f64> = set.iter().filter_map(bytes_of).collect();
        let total: f64 = values.iter().sum();
        Some(TrafficTotals {
            total_bytes: total,
            total_mb: bytes_to_mb(total),
            total_gb: bytes_to_gb(total),
            avg_bytes_per_record: (!values.is_empty()).then(|| total / values.len() as f64),
        })
    } else {
        skip("traffic_totals", fields::BYTES);
        None
    };

    let sources = if set.has_column(fields::SRC_IP) {
        Some(endpoint_stats(set, fields::SRC_IP, has_bytes, top_n))
    } else {
        skip("sources", fields::SRC_IP);
        None
    };
    let destinations = if set.has_column(fields::DST_IP) {
        Some(endpoint_stats(set, fields::DST_IP, has_bytes, top_n))
    } else {
        skip("destinations", fields::DST_IP);
        None
    };
    if !has_bytes {
        skip("top_ips_by_traffic", fields::BYTES);
    }

    let protocol_distribution = if set.has_column(fields::PROTOCOL) {
        let mut tally = GroupTally::new();
        for record in set {
            if let Some(key) = group_key(record, fields::PROTOCOL) {
                tally.add(&key, None);
            }
        }
        Some(tally.by_count(usize::MAX))
    } else {
        skip("protocol_distribution", fields::PROTOCOL);
        None
    };

    let timestamps: Vec<(NaiveDateTime, Option<f64>)> = set
        .iter()
        .filter_map(|r| r.timestamp().map(|ts| (ts, bytes_of(r))))
        .collect();

    let timespan = match (
        timestamps.iter().map(|(ts, _)| *ts).min(),
        timestamps.iter().map(|(ts, _)| *ts).max(),
    ) {
        (Some(start), Some(end)) => Some(Timespan {
            start,
            end,
            duration_hours: duration_hours(start, end),
        }),
        _ => {
            skip("timespan", fields::TIMESTAMP);
            None
        }
    };

    let (mut traffic_by_hour, mut connections_by_hour) = (None, None);
    let (mut traffic_by_day, mut connections_by_day) = (None, None);
    if has_timestamp {
        let mut hour_bytes = [0.0f64; 24];
        let mut hour_count = [0u64; 24];
        let mut day_bytes = [0.0f64; 7];
        let mut day_count = [0u64; 7];
        for (ts, bytes) in &timestamps {
            let hour = ts.hour() as usize;
            let day = weekday_index(*ts);
            hour_count[hour] += 1;
            day_count[day] += 1;
            if let Some(b) = bytes {
                hour_bytes[hour] += b;
                day_bytes[day] += b;
            }
        }
        connections_by_hour = Some(
            (0..24u32)
                .map(|h| GroupValue::new(h, hour_count[h as usize]))
                .collect(),
        );
        connections_by_day = Some(
            DAY_NAMES
                .iter()
                .zip(day_count)
                .map(|(name, n)| GroupValue::new(*name, n))
                .collect(),
        );
        if has_bytes {
            traffic_by_hour = Some(
                (0..24u32)
                    .map(|h| GroupValue::new(h, hour_bytes[h as usize]))
                    .collect(),
            );
            traffic_by_day = Some(
                DAY_NAMES
                    .iter()
                    .zip(day_bytes)
                    .map(|(name, b)| GroupValue::new(*name, b))
                    .collect(),
            );
        } else {
            skip("traffic_by_time", fields::BYTES);
        }
    } else {
        skip("activity_by_time", fields::TIMESTAMP);
    }

    let (mut top_destination_ports, mut top_ports_by_traffic) = (None, None);
    if set.has_column(fields::DST_PORT) {
        let mut tally = GroupTally::new();
        for record in set {
            if let Some(port) = record.integer(fields::DST_PORT) {
                tally.add(&port, bytes_of(record));
            }
        }
        top_destination_ports = Some(tally.by_count(top_n));
        if has_bytes {
            top_ports_by_traffic = Some(tally.by_sum(top_n));
        } else {
            skip("top_ports_by_traffic", fields::BYTES);
        }
    } else {
        skip("top_destination_ports", fields::DST_PORT);
    }

    SummaryStatistics {
        total_records: set.len(),
        traffic,
        sources,
        destinations,
        protocol_distribution,
        timespan,
        traffic_by_hour,
        connections_by_hour,
        traffic_by_day,
        connections_by_day,
        top_destination_ports,
        top_ports_by_traffic,
        skipped,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parse_log_content;
    use chrono::NaiveDate;

    fn ts(d: u32, h: u32) -> FieldValue {
        FieldValue::Timestamp(
            NaiveDate::from_ymd_opt(2023, 10, d)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap(),
        )
    }

    fn flow(day: u32, hour: u32, src: &str, dst: &str, port: i64, bytes: FieldValue) -> Record {
        [
            ("timestamp", ts(day, hour)),
            ("src_ip", FieldValue::text(src)),
            ("dst_ip", FieldValue::text(dst)),
            ("protocol", FieldValue::text(if port == 53 { "UDP" } else { "TCP" })),
            ("dst_port", FieldValue::Integer(port)),
            ("bytes", bytes),
        ]
        .into_iter()
        .collect()
    }

    fn sample() -> RecordSet {
        RecordSet::from_records(vec![
            flow(2, 8, "10.0.0.1", "1.1.1.1", 443, FieldValue::Integer(100)),
            flow(2, 9, "10.0.0.2", "8.8.8.8", 53, FieldValue::Integer(50)),
            flow(3, 8, "10.0.0.1", "1.1.1.1", 443, FieldValue::Float(400.0)),
            flow(5, 23, "10.0.0.3", "9.9.9.9", 80, FieldValue::Null),
        ])
    }

    #[test]
    fn test_csv_scenario_totals() {
        let outcome = parse_log_content(
            "timestamp,src_ip,bytes\n2023-10-05 08:00:00,10.0.0.1,1000\n2023-10-05 09:00:00,10.0.0.2,2048",
        )
        .unwrap();
        let stats = compute_summary(&outcome.records);
        let traffic = stats.traffic.unwrap();
        assert_eq!(traffic.total_bytes, 3048.0);
        assert!((traffic.total_mb - 0.00291).abs() < 1e-5);
        assert_eq!(traffic.avg_bytes_per_record, Some(1524.0));
    }

    #[test]
    fn test_null_bytes_counted_but_not_summed() {
        let stats = compute_summary(&sample());
        assert_eq!(stats.total_records, 4);
        let traffic = stats.traffic.unwrap();
        assert_eq!(traffic.total_bytes, 550.0);
        assert!((traffic.avg_bytes_per_record.unwrap() - 550.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_endpoint_rankings() {
        let stats = compute_summary(&sample());
        let sources = stats.sources.unwrap();
        assert_eq!(sources.unique, 3);
        assert_eq!(sources.top_by_count[0], GroupValue::new("10.0.0.1".to_string(), 2));
        let by_traffic = sources.top_by_traffic.unwrap();
        assert_eq!(by_traffic[0], GroupValue::new("10.0.0.1".to_string(), 500.0));
        assert_eq!(by_traffic[1].key, "10.0.0.2");
        // 10.0.0.3 only has a null bytes value.
        assert_eq!(by_traffic[2].value, 0.0);
    }

    #[test]
    fn test_protocol_distribution_descending() {
        let stats = compute_summary(&sample());
        let dist = stats.protocol_distribution.unwrap();
        assert_eq!(dist[0], GroupValue::new("TCP".to_string(), 3));
        assert_eq!(dist[1], GroupValue::new("UDP".to_string(), 1));
    }

    #[test]
    fn test_timespan() {
        let stats = compute_summary(&sample());
        let span = stats.timespan.unwrap();
        assert_eq!(span.start.to_string(), "2023-10-02 08:00:00");
        assert_eq!(span.end.to_string(), "2023-10-05 23:00:00");
        assert!((span.duration_hours - 87.0).abs() < 1e-9);
    }

    #[test]
    fn test_hour_and_day_buckets_are_complete() {
        let stats = compute_summary(&sample());
        let by_hour = stats.traffic_by_hour.unwrap();
        assert_eq!(by_hour.len(), 24);
        assert_eq!(by_hour[8].value, 500.0);
        assert_eq!(by_hour[0].value, 0.0);
        let conns = stats.connections_by_hour.unwrap();
        assert_eq!(conns.iter().map(|g| g.value).sum::<u64>(), 4);

        let by_day = stats.connections_by_day.unwrap();
        let names: Vec<&str> = by_day.iter().map(|g| g.key).collect();
        assert_eq!(names, DAY_NAMES.to_vec());
        // 2023-10-02 is a Monday.
        assert_eq!(by_day[0].value, 2);
        assert_eq!(by_day[3].value, 1);
        assert_eq!(stats.traffic_by_day.unwrap()[1].value, 400.0);
    }

    #[test]
    fn test_port_rankings() {
        let stats = compute_summary(&sample());
        let ports = stats.top_destination_ports.unwrap();
        assert_eq!(ports[0], GroupValue::new(443, 2));
        assert_eq!(ports.len(), 3);
        let by_traffic = stats.top_ports_by_traffic.unwrap();
        assert_eq!(by_traffic[0], GroupValue::new(443, 500.0));
    }

    #[test]
    fn test_top_n_limit_respected() {
        let records: Vec<Record> = (0..30)
            .map(|i| flow(2, 0, &format!("10.0.1.{i}"), "1.1.1.1", 1000 + i, FieldValue::Integer(i)))
            .collect();
        let stats = compute_summary_top(&RecordSet::from_records(records), 5);
        let sources = stats.sources.unwrap();
        assert_eq!(sources.unique, 30);
        assert_eq!(sources.top_by_count.len(), 5);
        let by_traffic = sources.top_by_traffic.unwrap();
        assert!(by_traffic.windows(2).all(|w| w[0].value >= w[1].value));
        assert_eq!(by_traffic[0].key, "10.0.1.29");
        assert_eq!(stats.top_destination_ports.unwrap().len(), 5);
    }

    #[test]
    fn test_missing_fields_are_skipped_not_errors() {
        let set = RecordSet::from_records(vec![[("protocol", FieldValue::text("TCP"))]
            .into_iter()
            .collect()]);
        let stats = compute_summary(&set);
        assert_eq!(stats.total_records, 1);
        assert!(stats.traffic.is_none());
        assert!(stats.sources.is_none());
        assert!(stats.timespan.is_none());
        assert!(stats.connections_by_hour.is_none());
        assert!(stats.protocol_distribution.is_some());
        let missing: Vec<&str> = stats.skipped.iter().map(|s| s.missing_field).collect();
        assert!(missing.contains(&"bytes"));
        assert!(missing.contains(&"timestamp"));
        assert!(missing.contains(&"dst_port"));
    }

    #[test]
    fn test_empty_set() {
        let stats = compute_summary(&sample().with_records(Vec::new()));
        assert_eq!(stats.total_records, 0);
        let traffic = stats.traffic.unwrap();
        assert_eq!(traffic.total_bytes, 0.0);
        assert_eq!(traffic.avg_bytes_per_record, None);
        assert!(stats.timespan.is_none());
        assert_eq!(stats.connections_by_hour.unwrap().len(), 24);
    }

    #[test]
    fn test_serializes_without_absent_sections() {
        let set = RecordSet::from_records(vec![[("bytes", FieldValue::Integer(3))]
            .into_iter()
            .collect()]);
        let json = serde_json::to_value(compute_summary(&set)).unwrap();
        assert_eq!(json["total_records"], 1);
        assert_eq!(json["traffic"]["total_bytes"], 3.0);
        assert!(json.get("sources").is_none());
        assert!(json["skipped"].as_array().unwrap().len() > 0);
    }
}
