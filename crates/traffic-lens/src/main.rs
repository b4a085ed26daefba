mod bootstrap;
mod report;

use anyhow::{Context, Result};
use traffic_core::settings::Settings;
use traffic_data::aggregator::compute_summary_top;
use traffic_data::charts::prepare_charts;
use traffic_data::export::{export_records, export_summary};
use traffic_data::filter::apply_filter;
use traffic_data::load_log_file;

use report::{AnalysisReport, SourceInfo};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("traffic-lens v{} starting", env!("CARGO_PKG_VERSION"));

    let filter = settings.filter_state()?;
    let interval = settings.interval();
    let top_n = settings.top_n as usize;

    let outcome = load_log_file(&settings.input)
        .with_context(|| format!("could not analyse {}", settings.input.display()))?;

    let filtered = apply_filter(&outcome.records, &filter);
    if !filter.is_empty() {
        tracing::info!(
            "Filter kept {} of {} records",
            filtered.len(),
            outcome.records.len()
        );
    }

    let summary = compute_summary_top(&filtered, top_n);
    let charts = prepare_charts(&filtered, interval, top_n);

    let report = AnalysisReport {
        source: SourceInfo {
            file: &settings.input,
            format: outcome.format,
            lines_considered: outcome.lines_considered,
            records_parsed: outcome.records.len(),
            coercion_failures: outcome.coercion_failure_count(),
        },
        filter: &filter,
        interval,
        records_after_filter: filtered.len(),
        summary: &summary,
        charts: &charts,
    };

    match settings.output.as_str() {
        "json" => println!("{}", report.to_json()?),
        _ => print!("{}", report.render_text()),
    }

    if let Some(path) = &settings.export_records {
        export_records(&filtered, path)
            .with_context(|| format!("could not export records to {}", path.display()))?;
    }
    if let Some(path) = &settings.export_summary {
        export_summary(&filtered, path)
            .with_context(|| format!("could not write summary to {}", path.display()))?;
    }

    Ok(())
}
