//! One-shot, non-interactive query driven by command-line flags.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use bikeshare_core::catalog::Catalog;
use bikeshare_core::models::{ColumnSet, LoadStats, Selection};
use bikeshare_core::settings::Settings;
use bikeshare_data::reader;
use bikeshare_data::reports::{run_report, Report, ReportKind};
use serde::Serialize;
use tracing::debug;

use crate::render;

/// JSON document printed for `--format json`.
#[derive(Debug, Serialize)]
struct QueryOutput<'a> {
    selection: &'a Selection,
    columns: ColumnSet,
    stats: LoadStats,
    reports: Vec<Report<'a>>,
}

/// Load `city` with the month/day filters from `settings` and print the
/// requested reports.
pub fn run(
    settings: &Settings,
    catalog: &Catalog,
    data_dir: &Path,
    city: &str,
    out: &mut impl Write,
) -> Result<()> {
    let kinds = settings
        .report_names()
        .into_iter()
        .map(str::parse::<ReportKind>)
        .collect::<Result<Vec<_>, _>>()?;

    let dataset = reader::load(catalog, data_dir, city, &settings.month, &settings.day)?;
    debug!("Running {} reports over {} trips", kinds.len(), dataset.len());

    if settings.wants_json() {
        let output = QueryOutput {
            selection: &dataset.selection,
            columns: dataset.columns,
            stats: dataset.stats,
            reports: kinds.iter().map(|&kind| run_report(kind, &dataset)).collect(),
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
        return Ok(());
    }

    render::load_summary(out, &dataset)?;
    render::separator(out)?;
    for kind in kinds {
        let started = Instant::now();
        let report = run_report(kind, &dataset);
        render::report(out, &report, dataset.columns)?;
        render::elapsed(out, started.elapsed())?;
        render::separator(out)?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
