//! Calendar-aligned time series over a record set.

use chrono::NaiveDateTime;
use serde::Serialize;
use traffic_core::formatting::bytes_to_mb;
use traffic_core::models::{fields, Interval, RecordSet};
use traffic_core::time_utils::{interval_step, truncate_to_interval};

/// What each bucket measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesUnit {
    Bytes,
    Megabytes,
    Connections,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub start: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub interval: Interval,
    pub unit: SeriesUnit,
    pub buckets: Vec<TimeBucket>,
}

impl TimeSeries {
    pub fn total(&self) -> f64 {
        self.buckets.iter().map(|b| b.value).sum()
    }
}

/// Bucket `set` by `interval`.
///
/// Buckets run from the bucket holding the earliest timestamp through the one
/// holding the latest, without gaps; empty buckets hold zero. Records without
/// a timestamp are ignored, as are null `bytes` values for byte series.
/// Returns `None` when the schema lacks `timestamp` (or `bytes` for a byte
/// series) or no record has a timestamp.
pub fn resample(set: &RecordSet, interval: Interval, unit: SeriesUnit) -> Option<TimeSeries> {
    if !set.has_column(fields::TIMESTAMP) {
        return None;
    }
    if unit != SeriesUnit::Connections && !set.has_column(fields::BYTES) {
        return None;
    }

    let points: Vec<(NaiveDateTime, f64)> = set
        .iter()
        .filter_map(|r| {
            let ts = r.timestamp()?;
            let value = match unit {
                SeriesUnit::Connections => 1.0,
                SeriesUnit::Bytes => r.number(fields::BYTES).unwrap_or(0.0),
                SeriesUnit::Megabytes => bytes_to_mb(r.number(fields::BYTES).unwrap_or(0.0)),
            };
            Some((truncate_to_interval(ts, interval), value))
        })
        .collect();

    let first = points.iter().map(|(b, _)| *b).min()?;
    let last = points.iter().map(|(b, _)| *b).max()?;
    let step = interval_step(interval);

    let mut buckets = Vec::new();
    let mut cursor = first;
    while cursor <= last {
        buckets.push(TimeBucket {
            start: cursor,
            value: 0.0,
        });
        cursor += step;
    }

    let step_secs = step.num_seconds();
    for (bucket, value) in points {
        let idx = ((bucket - first).num_seconds() / step_secs) as usize;
        buckets[idx].value += value;
    }

    Some(TimeSeries {
        interval,
        unit,
        buckets,
    })
}

/// Traffic volume per bucket in MB.
pub fn bandwidth_over_time(set: &RecordSet, interval: Interval) -> Option<TimeSeries> {
    resample(set, interval, SeriesUnit::Megabytes)
}

/// Record count per bucket.
pub fn connections_over_time(set: &RecordSet, interval: Interval) -> Option<TimeSeries> {
    resample(set, interval, SeriesUnit::Connections)
}
