//! Series prepared for plotting.
//!
//! These are the shapes the presentation layer draws directly; every builder
//! returns `None` when the fields it needs are missing from the schema.

use chrono::Timelike;
use serde::Serialize;
use traffic_core::formatting::bytes_to_mb;
use traffic_core::models::{fields, Interval, RecordSet};
use traffic_core::time_utils::{weekday_index, DAY_NAMES};

use crate::aggregator::group_key;
use crate::ranking::{GroupTally, GroupValue};
use crate::resample::{bandwidth_over_time, connections_over_time, TimeSeries};

/// Slices kept before the remainder is folded into `"Other"`.
pub const PROTOCOL_SLICES: usize = 10;

/// Label of the folded remainder slice.
pub const OTHER_LABEL: &str = "Other";

/// Protocol counts, largest first, with the tail beyond
/// [`PROTOCOL_SLICES`] folded into one `"Other"` entry.
pub fn protocol_shares(set: &RecordSet) -> Option<Vec<GroupValue<String, u64>>> {
    if !set.has_column(fields::PROTOCOL) {
        return None;
    }
    let mut tally = GroupTally::new();
    for record in set {
        if let Some(p) = group_key(record, fields::PROTOCOL) {
            tally.add(&p, None);
        }
    }
    let mut ranked = tally.by_count(usize::MAX);
    if ranked.len() > PROTOCOL_SLICES {
        let other: u64 = ranked.split_off(PROTOCOL_SLICES).iter().map(|g| g.value).sum();
        ranked.push(GroupValue::new(OTHER_LABEL.to_string(), other));
    }
    Some(ranked)
}

// ── Heatmap ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapMeasure {
    TrafficMb,
    ConnectionCount,
}

/// Day-of-week × hour-of-day activity grid, Monday first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityHeatmap {
    pub measure: HeatmapMeasure,
    pub days: [&'static str; 7],
    pub cells: [[f64; 24]; 7],
}

impl ActivityHeatmap {
    /// The busiest `(day, hour)` cell, if any cell is non-zero.
    pub fn peak(&self) -> Option<(&'static str, u32, f64)> {
        let mut best: Option<(&'static str, u32, f64)> = None;
        for (day, row) in self.cells.iter().enumerate() {
            for (hour, &value) in row.iter().enumerate() {
                if value > 0.0 && best.map_or(true, |(_, _, v)| value > v) {
                    best = Some((self.days[day], hour as u32, value));
                }
            }
        }
        best
    }
}

/// Traffic in MB per cell when `bytes` is present, else connection counts.
pub fn activity_heatmap(set: &RecordSet) -> Option<ActivityHeatmap> {
    if !set.has_column(fields::TIMESTAMP) {
        return None;
    }
    let measure = if set.has_column(fields::BYTES) {
        HeatmapMeasure::TrafficMb
    } else {
        HeatmapMeasure::ConnectionCount
    };
    let mut cells = [[0.0f64; 24]; 7];
    for record in set {
        let Some(ts) = record.timestamp() else {
            continue;
        };
        let value = match measure {
            HeatmapMeasure::TrafficMb => bytes_to_mb(record.number(fields::BYTES).unwrap_or(0.0)),
            HeatmapMeasure::ConnectionCount => 1.0,
        };
        cells[weekday_index(ts)][ts.hour() as usize] += value;
    }
    Some(ActivityHeatmap {
        measure,
        days: DAY_NAMES,
        cells,
    })
}

// ── Rankings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionPair {
    pub src_ip: String,
    pub dst_ip: String,
    pub count: u64,
}

/// Most frequent `src_ip → dst_ip` pairs.
pub fn top_connection_pairs(set: &RecordSet, n: usize) -> Option<Vec<ConnectionPair>> {
    if !set.has_column(fields::SRC_IP) || !set.has_column(fields::DST_IP) {
        return None;
    }
    let mut tally = GroupTally::new();
    for record in set {
        if let (Some(src), Some(dst)) = (
            group_key(record, fields::SRC_IP),
            group_key(record, fields::DST_IP),
        ) {
            tally.add(&(src, dst), None);
        }
    }
    Some(
        tally
            .by_count(n)
            .into_iter()
            .map(|g| ConnectionPair {
                src_ip: g.key.0,
                dst_ip: g.key.1,
                count: g.value,
            })
            .collect(),
    )
}

/// Addresses in `column` ranked by traffic, values in MB.
pub fn top_ips_by_traffic_mb(set: &RecordSet, column: &str, n: usize) -> Option<Vec<GroupValue<String, f64>>> {
    if !set.has_column(column) || !set.has_column(fields::BYTES) {
        return None;
    }
    let mut tally = GroupTally::new();
    for record in set {
        if let Some(ip) = group_key(record, column) {
            tally.add(&ip, record.number(fields::BYTES));
        }
    }
    Some(
        tally
            .by_sum(n)
            .into_iter()
            .map(|g| GroupValue::new(g.key, bytes_to_mb(g.value)))
            .collect(),
    )
}

// ── Bundle ────────────────────────────────────────────────────────────────────

/// Everything the report draws, computed from one filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub bandwidth: Option<TimeSeries>,
    pub connections: Option<TimeSeries>,
    pub protocol_shares: Option<Vec<GroupValue<String, u64>>>,
    pub heatmap: Option<ActivityHeatmap>,
    pub top_pairs: Option<Vec<ConnectionPair>>,
    pub top_sources_mb: Option<Vec<GroupValue<String, f64>>>,
    pub top_destinations_mb: Option<Vec<GroupValue<String, f64>>>,
}

pub fn prepare_charts(set: &RecordSet, interval: Interval, top_n: usize) -> ChartData {
    ChartData {
        bandwidth: bandwidth_over_time(set, interval),
        connections: connections_over_time(set, interval),
        protocol_shares: protocol_shares(set),
        heatmap: activity_heatmap(set),
        top_pairs: top_connection_pairs(set, top_n),
        top_sources_mb: top_ips_by_traffic_mb(set, fields::SRC_IP, top_n),
        top_destinations_mb: top_ips_by_traffic_mb(set, fields::DST_IP, top_n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use traffic_core::models::{FieldValue, Record};

    fn flow(src: &str, dst: &str, proto: &str, bytes: i64) -> Record {
        [
            (
                "timestamp",
                FieldValue::Timestamp(
                    NaiveDate::from_ymd_opt(2023, 10, 3)
                        .unwrap()
                        .and_hms_opt(14, 5, 0)
                        .unwrap(),
                ),
            ),
            ("src_ip", FieldValue::text(src)),
            ("dst_ip", FieldValue::text(dst)),
            ("protocol", FieldValue::text(proto)),
            ("bytes", FieldValue::Integer(bytes)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_protocol_shares_fold_tail_into_other() {
        let mut records = Vec::new();
        for i in 0..12 {
            for _ in 0..(20 - i) {
                records.push(flow("a", "b", &format!("P{i}"), 1));
            }
        }
        let shares = protocol_shares(&RecordSet::from_records(records)).unwrap();
        assert_eq!(shares.len(), PROTOCOL_SLICES + 1);
        assert_eq!(shares[0], GroupValue::new("P0".to_string(), 20));
        // P10 had 10 records and P11 had 9.
        assert_eq!(shares[10], GroupValue::new(OTHER_LABEL.to_string(), 19));
    }

    #[test]
    fn test_protocol_shares_without_tail() {
        let set = RecordSet::from_records(vec![flow("a", "b", "TCP", 1), flow("a", "b", "UDP", 1)]);
        let shares = protocol_shares(&set).unwrap();
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|g| g.key != OTHER_LABEL));
    }

    #[test]
    fn test_heatmap_uses_megabytes() {
        let set = RecordSet::from_records(vec![flow("a", "b", "TCP", 1024 * 1024)]);
        let map = activity_heatmap(&set).unwrap();
        assert_eq!(map.measure, HeatmapMeasure::TrafficMb);
        // 2023-10-03 is a Tuesday.
        assert_eq!(map.cells[1][14], 1.0);
        assert_eq!(map.peak(), Some(("Tuesday", 14, 1.0)));
    }

    #[test]
    fn test_heatmap_counts_without_bytes() {
        let record: Record = [(
            "timestamp",
            FieldValue::Timestamp(NaiveDate::from_ymd_opt(2023, 10, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()),
        )]
        .into_iter()
        .collect();
        let map = activity_heatmap(&RecordSet::from_records(vec![record.clone(), record])).unwrap();
        assert_eq!(map.measure, HeatmapMeasure::ConnectionCount);
        assert_eq!(map.cells[0][0], 2.0);
    }

    #[test]
    fn test_top_connection_pairs() {
        let set = RecordSet::from_records(vec![
            flow("a", "b", "TCP", 1),
            flow("c", "d", "TCP", 1),
            flow("c", "d", "TCP", 1),
            flow("a", "d", "TCP", 1),
        ]);
        let pairs = top_connection_pairs(&set, 2).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs[0],
            ConnectionPair {
                src_ip: "c".to_string(),
                dst_ip: "d".to_string(),
                count: 2
            }
        );
        assert_eq!(pairs[1].src_ip, "a");
        assert_eq!(pairs[1].dst_ip, "b");
    }

    #[test]
    fn test_top_ips_by_traffic_mb() {
        let set = RecordSet::from_records(vec![
            flow("a", "b", "TCP", 1024 * 1024),
            flow("c", "b", "TCP", 3 * 1024 * 1024),
        ]);
        let top = top_ips_by_traffic_mb(&set, fields::SRC_IP, 10).unwrap();
        assert_eq!(top[0], GroupValue::new("c".to_string(), 3.0));
        assert_eq!(top[1], GroupValue::new("a".to_string(), 1.0));
        assert!(top_ips_by_traffic_mb(&set, "nat_ip", 10).is_none());
    }

    #[test]
    fn test_prepare_charts_fills_available_series() {
        let set = RecordSet::from_records(vec![flow("a", "b", "TCP", 10)]);
        let charts = prepare_charts(&set, Interval::Hourly, 10);
        assert!(charts.bandwidth.is_some());
        assert!(charts.connections.is_some());
        assert!(charts.heatmap.is_some());
        assert_eq!(charts.top_pairs.unwrap().len(), 1);
    }
}
