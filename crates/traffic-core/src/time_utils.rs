use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::models::Interval;

/// Day-of-week names, Monday first.
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Index into [`DAY_NAMES`] for `ts` (Monday = 0).
pub fn weekday_index(ts: NaiveDateTime) -> usize {
    ts.weekday().num_days_from_monday() as usize
}

/// Width of one bucket of `interval`.
pub fn interval_step(interval: Interval) -> TimeDelta {
    match interval {
        Interval::Hourly => TimeDelta::hours(1),
        Interval::Daily => TimeDelta::days(1),
        Interval::Weekly => TimeDelta::weeks(1),
    }
}

/// Round `ts` down to the calendar boundary of `interval`.
///
/// * hourly → start of the hour
/// * daily  → midnight
/// * weekly → Monday 00:00 of the ISO week
pub fn truncate_to_interval(ts: NaiveDateTime, interval: Interval) -> NaiveDateTime {
    match interval {
        Interval::Hourly => ts
            .date()
            .and_time(NaiveTime::from_hms_opt(ts.hour(), 0, 0).unwrap_or(NaiveTime::MIN)),
        Interval::Daily => ts.date().and_time(NaiveTime::MIN),
        Interval::Weekly => {
            let offset = TimeDelta::days(i64::from(ts.weekday().num_days_from_monday()));
            (ts.date() - offset).and_time(NaiveTime::MIN)
        }
    }
}

/// Hours between `start` and `end` as a float.
pub fn duration_hours(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

// ── Tests ─────────────────────────────────────────────────────────────────────
