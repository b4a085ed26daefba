//! Record and summary exports.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;
use traffic_core::formatting::bytes_to_mb;
use traffic_core::models::RecordSet;
use traffic_core::Result;

use crate::aggregator::compute_summary_top;

/// Entries listed per ranking in the statistics summary.
pub const SUMMARY_TOP: usize = 5;

// ── Records ───────────────────────────────────────────────────────────────────

/// Write `set` as CSV: one column per schema field, nulls and absent fields
/// as empty cells.
pub fn write_records_csv<W: Write>(set: &RecordSet, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(set.columns())?;
    for record in set {
        let row: Vec<String> = set
            .columns()
            .iter()
            .map(|c| {
                record
                    .get(c)
                    .and_then(|v| v.to_display_string())
                    .unwrap_or_default()
            })
            .collect();
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}

/// Write `set` as a JSON array of objects.
pub fn write_records_json<W: Write>(set: &RecordSet, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, set.records())?;
    Ok(())
}

/// Export `set` to `path`; a `.json` extension selects JSON, anything else CSV.
pub fn export_records(set: &RecordSet, path: &Path) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        write_records_json(set, file)?;
    } else {
        write_records_csv(set, file)?;
    }
    info!("Exported {} records to {}", set.len(), path.display());
    Ok(())
}

// ── Statistics summary ────────────────────────────────────────────────────────

fn row(label: impl Into<String>, value: impl Into<String>) -> [String; 2] {
    [label.into(), value.into()]
}

/// Two-column statistics summary: general figures, top sources and
/// destinations by traffic, and the leading protocols. Sections whose fields
/// are missing are left out.
pub fn summary_rows(set: &RecordSet) -> Vec<[String; 2]> {
    let stats = compute_summary_top(set, SUMMARY_TOP);
    let mut rows = vec![
        row("General Statistics", ""),
        row("Total Records", stats.total_records.to_string()),
    ];

    if let Some(traffic) = &stats.traffic {
        rows.push(row("Total Traffic (GB)", format!("{:.2}", traffic.total_gb)));
    }
    if let Some(sources) = &stats.sources {
        rows.push(row("Unique Source IPs", sources.unique.to_string()));
    }
    if let Some(destinations) = &stats.destinations {
        rows.push(row("Unique Destination IPs", destinations.unique.to_string()));
    }
    if let Some(dist) = &stats.protocol_distribution {
        rows.push(row("Unique Protocols", dist.len().to_string()));
    }
    rows.push(row("", ""));

    let sections = [
        ("Top 5 Source IPs by Traffic", stats.sources.as_ref()),
        ("Top 5 Destination IPs by Traffic", stats.destinations.as_ref()),
    ];
    for (title, endpoint) in sections {
        let Some(top) = endpoint.and_then(|e| e.top_by_traffic.as_ref()) else {
            continue;
        };
        rows.push(row(title, ""));
        for entry in top {
            rows.push(row(
                entry.key.clone(),
                format!("{:.2} MB", bytes_to_mb(entry.value)),
            ));
        }
        rows.push(row("", ""));
    }

    if let Some(dist) = &stats.protocol_distribution {
        rows.push(row("Protocol Distribution", ""));
        for entry in dist.iter().take(SUMMARY_TOP) {
            rows.push(row(entry.key.clone(), entry.value.to_string()));
        }
    }
    rows
}

pub fn write_summary_csv<W: Write>(set: &RecordSet, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for r in summary_rows(set) {
        out.write_record(&r)?;
    }
    out.flush()?;
    Ok(())
}

pub fn export_summary(set: &RecordSet, path: &Path) -> Result<()> {
    write_summary_csv(set, BufWriter::new(File::create(path)?))?;
    info!("Wrote statistics summary to {}", path.display());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parse_log_content;
    use tempfile::TempDir;

    const LOG: &str = "\
timestamp,src_ip,dst_ip,protocol,bytes
2023-10-05 08:00:00,10.0.0.1,1.1.1.1,TCP,1048576
2023-10-05 09:00:00,10.0.0.2,8.8.8.8,UDP,
2023-10-05 10:00:00,10.0.0.1,8.8.8.8,TCP,2097152
";

    fn set() -> RecordSet {
        parse_log_content(LOG).unwrap().records
    }

    #[test]
    fn test_records_csv_layout() {
        let mut buf = Vec::new();
        write_records_csv(&set(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,src_ip,dst_ip,protocol,bytes");
        assert_eq!(lines[1], "2023-10-05 08:00:00,10.0.0.1,1.1.1.1,TCP,1048576");
        assert_eq!(lines[2], "2023-10-05 09:00:00,10.0.0.2,8.8.8.8,UDP,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_records_json_uses_null() {
        let mut buf = Vec::new();
        write_records_json(&set(), &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1]["bytes"].is_null());
        assert_eq!(rows[0]["bytes"], 1048576);
        assert_eq!(rows[0]["protocol"], "TCP");
    }

    #[test]
    fn test_export_records_by_extension() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("out.csv");
        let json_path = dir.path().join("out.JSON");
        export_records(&set(), &csv_path).unwrap();
        export_records(&set(), &json_path).unwrap();
        assert!(std::fs::read_to_string(csv_path).unwrap().starts_with("timestamp,"));
        assert!(std::fs::read_to_string(json_path).unwrap().trim_start().starts_with('['));
    }

    #[test]
    fn test_summary_rows() {
        let rows = summary_rows(&set());
        let find = |label: &str| rows.iter().position(|r| r[0] == label);
        assert_eq!(rows[0], row("General Statistics", ""));
        assert_eq!(rows[1], row("Total Records", "3"));
        assert_eq!(rows[2], row("Total Traffic (GB)", "0.00"));
        assert_eq!(rows[3], row("Unique Source IPs", "2"));
        assert_eq!(rows[5], row("Unique Protocols", "2"));

        let src = find("Top 5 Source IPs by Traffic").unwrap();
        assert_eq!(rows[src + 1], row("10.0.0.1", "3.00 MB"));
        assert_eq!(rows[src + 2], row("10.0.0.2", "0.00 MB"));

        let proto = find("Protocol Distribution").unwrap();
        assert_eq!(rows[proto + 1], row("TCP", "2"));
        assert_eq!(rows.last().unwrap(), &row("UDP", "1"));
    }

    #[test]
    fn test_summary_without_bytes_omits_traffic_sections() {
        let set = parse_log_content("src_ip,protocol\n10.0.0.1,TCP\n").unwrap().records;
        let rows = summary_rows(&set);
        assert!(rows.iter().all(|r| r[0] != "Total Traffic (GB)"));
        assert!(rows.iter().all(|r| r[0] != "Top 5 Source IPs by Traffic"));
    }

    #[test]
    fn test_export_summary_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");
        export_summary(&set(), &path).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("General Statistics,\n"));
        assert!(text.contains("Total Records,3\n"));
    }
}
