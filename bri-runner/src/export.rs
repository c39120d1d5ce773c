//! Result export: CSV tables and versioned JSON documents.
//!
//! - **CSV**: one row per date; the full column surface, or only the scored
//!   columns (percentiles, averages, indicators) when moment values are
//!   excluded. Missing values are written as empty fields.
//! - **JSON**: a `ResultDocument` carrying `schema_version`. Newer versions
//!   are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bri_core::{BriRecord, BriResultTable, StatusSnapshot};
use serde::{Deserialize, Serialize};

use crate::batch::{AssetOutcome, BatchReport};

pub const SCHEMA_VERSION: u32 = 1;

fn is_scored_column(name: &str) -> bool {
    matches!(name, "price" | "returns" | "composite_bri")
        || name.ends_with("_indicator")
        || name.ends_with("_avg_percentile")
        || name.ends_with("_pctile")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Render a result table as CSV.
pub fn export_csv(table: &BriResultTable, include_moment_values: bool) -> Result<String> {
    let columns: Vec<(String, &[f64])> = table
        .columns()
        .into_iter()
        .filter(|(name, _)| include_moment_values || is_scored_column(name))
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("date");
    header.extend(columns.iter().map(|(name, _)| name.as_str()));
    wtr.write_record(&header)?;

    for (i, date) in table.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(date.to_string());
        record.extend(columns.iter().map(|(_, values)| format_value(values[i])));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write a result table to a CSV file.
pub fn write_csv(table: &BriResultTable, path: &Path, include_moment_values: bool) -> Result<()> {
    let csv = export_csv(table, include_moment_values)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

// ─── JSON export ────────────────────────────────────────────────────

/// Persistable per-asset result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub schema_version: u32,
    pub asset_id: String,
    pub config_fingerprint: String,
    pub dataset_hash: Option<String>,
    pub synthetic: bool,
    pub status: Option<StatusSnapshot>,
    pub records: Vec<BriRecord>,
}

impl ResultDocument {
    pub fn from_table(asset_id: &str, table: &BriResultTable) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            asset_id: asset_id.to_string(),
            config_fingerprint: table.config_fingerprint().to_string(),
            dataset_hash: None,
            synthetic: false,
            status: bri_core::current_status(table),
            records: table.records(),
        }
    }
}

pub fn export_json(doc: &ResultDocument) -> Result<String> {
    serde_json::to_string_pretty(doc).context("failed to serialize ResultDocument to JSON")
}

/// Parse a `ResultDocument`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ResultDocument> {
    let doc: ResultDocument =
        serde_json::from_str(json).context("failed to deserialize ResultDocument from JSON")?;
    if doc.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            doc.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(doc)
}

// ─── Batch artifacts ────────────────────────────────────────────────

/// Write `<asset>.csv` and `<asset>.json` per successful asset plus
/// `summary.json` for the whole batch. Returns the files written.
pub fn save_batch(
    report: &BatchReport,
    output_dir: &Path,
    include_moment_values: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let mut written = Vec::new();
    for outcome in &report.outcomes {
        let AssetOutcome::Success(run) = outcome else {
            continue;
        };

        let csv_path = output_dir.join(format!("{}.csv", run.asset_id));
        write_csv(&run.table, &csv_path, include_moment_values)?;
        written.push(csv_path);

        let mut doc = ResultDocument::from_table(&run.asset_id, &run.table);
        doc.dataset_hash = Some(run.dataset_hash.clone());
        doc.synthetic = run.is_synthetic();
        let json_path = output_dir.join(format!("{}.json", run.asset_id));
        std::fs::write(&json_path, export_json(&doc)?)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        written.push(json_path);
    }

    let summary_path = output_dir.join("summary.json");
    let summary = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "config_fingerprint": report.config_fingerprint,
        "succeeded": report.succeeded(),
        "failed": report.failed(),
        "assets": report.summary(),
    });
    std::fs::write(
        &summary_path,
        serde_json::to_string_pretty(&summary).context("failed to serialize batch summary")?,
    )
    .with_context(|| format!("failed to write {}", summary_path.display()))?;
    written.push(summary_path);

    Ok(written)
}
