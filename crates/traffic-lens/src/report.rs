//! Text and JSON rendering of an analysis run.

use std::fmt::Write;
use std::path::Path;

use serde::Serialize;
use traffic_core::formatting::{format_bytes, format_number, percentage};
use traffic_core::models::{FilterState, Interval};
use traffic_data::aggregator::SummaryStatistics;
use traffic_data::charts::{ChartData, HeatmapMeasure};
use traffic_data::detectors::LogFormat;
use traffic_data::resample::{SeriesUnit, TimeSeries};

/// Where the records came from and how they were read.
#[derive(Debug, Serialize)]
pub struct SourceInfo<'a> {
    pub file: &'a Path,
    pub format: LogFormat,
    pub lines_considered: usize,
    pub records_parsed: usize,
    pub coercion_failures: usize,
}

/// Everything one run produces.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub source: SourceInfo<'a>,
    pub filter: &'a FilterState,
    pub interval: Interval,
    pub records_after_filter: usize,
    pub summary: &'a SummaryStatistics,
    pub charts: &'a ChartData,
}

impl AnalysisReport<'_> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text report for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        let s = self.summary;
        writeln!(out, "Traffic report for {}", self.source.file.display())?;
        write!(
            out,
            "Format: {} ({} lines, {} records",
            self.source.format, self.source.lines_considered, self.source.records_parsed
        )?;
        if self.source.coercion_failures > 0 {
            write!(out, ", {} unconvertible values", self.source.coercion_failures)?;
        }
        writeln!(out, ")")?;
        if !self.filter.is_empty() {
            writeln!(
                out,
                "Filtered: {} of {} records",
                self.records_after_filter, self.source.records_parsed
            )?;
        }

        section(out, "Overview")?;
        writeln!(out, "  Total records       {}", format_number(s.total_records as f64, 0))?;
        if let Some(t) = &s.traffic {
            writeln!(out, "  Total traffic       {}", format_bytes(t.total_bytes))?;
            if let Some(avg) = t.avg_bytes_per_record {
                writeln!(out, "  Avg per record      {}", format_bytes(avg))?;
            }
        }
        if let Some(span) = &s.timespan {
            writeln!(out, "  First record        {}", span.start.format("%Y-%m-%d %H:%M:%S"))?;
            writeln!(out, "  Last record         {}", span.end.format("%Y-%m-%d %H:%M:%S"))?;
            writeln!(out, "  Duration            {} h", format_number(span.duration_hours, 1))?;
        }
        if let Some(src) = &s.sources {
            writeln!(out, "  Unique sources      {}", src.unique)?;
        }
        if let Some(dst) = &s.destinations {
            writeln!(out, "  Unique destinations {}", dst.unique)?;
        }

        if let Some(src) = &s.sources {
            section(out, "Top sources")?;
            for g in &src.top_by_count {
                writeln!(out, "  {:<40} {:>10}", g.key, format_number(g.value as f64, 0))?;
            }
        }
        if let Some(dst) = &s.destinations {
            section(out, "Top destinations")?;
            for g in &dst.top_by_count {
                writeln!(out, "  {:<40} {:>10}", g.key, format_number(g.value as f64, 0))?;
            }
        }
        if let Some(top) = &self.charts.top_sources_mb {
            section(out, "Top sources by traffic (MB)")?;
            for g in top {
                writeln!(out, "  {:<40} {:>10}", g.key, format_number(g.value, 2))?;
            }
        }
        if let Some(top) = &self.charts.top_destinations_mb {
            section(out, "Top destinations by traffic (MB)")?;
            for g in top {
                writeln!(out, "  {:<40} {:>10}", g.key, format_number(g.value, 2))?;
            }
        }
        if let Some(pairs) = &self.charts.top_pairs {
            section(out, "Top connection pairs")?;
            for p in pairs {
                writeln!(
                    out,
                    "  {:<20} -> {:<20} {:>8}",
                    p.src_ip,
                    p.dst_ip,
                    format_number(p.count as f64, 0)
                )?;
            }
        }
        if let Some(shares) = &self.charts.protocol_shares {
            section(out, "Protocols")?;
            let total: u64 = shares.iter().map(|g| g.value).sum();
            for g in shares {
                writeln!(
                    out,
                    "  {:<12} {:>10} {:>6.1}%",
                    g.key,
                    format_number(g.value as f64, 0),
                    percentage(g.value as f64, total as f64)
                )?;
            }
        }
        if let Some(ports) = &s.top_destination_ports {
            section(out, "Top destination ports")?;
            for g in ports {
                writeln!(out, "  {:<8} {:>10}", g.key, format_number(g.value as f64, 0))?;
            }
        }

        for series in [&self.charts.bandwidth, &self.charts.connections]
            .into_iter()
            .flatten()
        {
            write_series(out, series)?;
        }

        if let Some(map) = &self.charts.heatmap {
            if let Some((day, hour, value)) = map.peak() {
                let unit = match map.measure {
                    HeatmapMeasure::TrafficMb => "MB",
                    HeatmapMeasure::ConnectionCount => "connections",
                };
                section(out, "Busiest hour")?;
                writeln!(out, "  {} {:02}:00  {} {}", day, hour, format_number(value, 2), unit)?;
            }
        }

        if !s.skipped.is_empty() {
            section(out, "Not available")?;
            for skip in &s.skipped {
                writeln!(out, "  {} (no {} field)", skip.statistic, skip.missing_field)?;
            }
        }
        Ok(())
    }
}

fn section(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "─".repeat(title.chars().count()))
}

fn write_series(out: &mut String, series: &TimeSeries) -> std::fmt::Result {
    let (title, decimals) = match series.unit {
        SeriesUnit::Megabytes => ("Bandwidth (MB)", 2),
        SeriesUnit::Bytes => ("Bandwidth (bytes)", 0),
        SeriesUnit::Connections => ("Connections", 0),
    };
    let fmt = match series.interval {
        Interval::Hourly => "%Y-%m-%d %H:00",
        Interval::Daily | Interval::Weekly => "%Y-%m-%d",
    };
    section(out, &format!("{title}, {}", series.interval))?;
    for bucket in &series.buckets {
        writeln!(
            out,
            "  {:<16} {:>12}",
            bucket.start.format(fmt),
            format_number(bucket.value, decimals)
        )?;
    }
    Ok(())
}
