//! Multi-asset batches.
//!
//! One BRI computation per asset, fanned out over the rayon pool with the
//! configuration shared by reference. A failing asset is reported, not
//! propagated; outcomes come back in input order.

use std::time::Instant;

use bri_core::data::{DataSource, PriceDataProvider};
use bri_core::{calculate_full_bri, current_status, BriConfig, BriResultTable, StatusSnapshot};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::data_loader::{load_series, SyntheticProvider};

/// A successfully scored asset.
#[derive(Debug, Clone)]
pub struct AssetRun {
    pub asset_id: String,
    pub source: DataSource,
    pub dataset_hash: String,
    pub table: BriResultTable,
    pub status: Option<StatusSnapshot>,
    pub elapsed_ms: u64,
}

impl AssetRun {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Result of one asset in a batch.
#[derive(Debug, Clone)]
pub enum AssetOutcome {
    Success(Box<AssetRun>),
    Failure { asset_id: String, error: String },
}

impl AssetOutcome {
    pub fn asset_id(&self) -> &str {
        match self {
            AssetOutcome::Success(run) => &run.asset_id,
            AssetOutcome::Failure { asset_id, .. } => asset_id,
        }
    }

    pub fn run(&self) -> Option<&AssetRun> {
        match self {
            AssetOutcome::Success(run) => Some(run.as_ref()),
            AssetOutcome::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AssetOutcome::Success(_))
    }
}

/// Options for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Generate synthetic data for assets the provider cannot supply.
    pub synthetic_fallback: Option<SyntheticProvider>,
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub config_fingerprint: String,
    pub outcomes: Vec<AssetOutcome>,
}

/// One line of a batch summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummaryRow {
    pub asset_id: String,
    pub success: bool,
    pub rows: usize,
    pub valid_rows: usize,
    pub latest_date: Option<chrono::NaiveDate>,
    pub composite_bri: Option<f64>,
    pub synthetic: bool,
    pub error: Option<String>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn get(&self, asset_id: &str) -> Option<&AssetOutcome> {
        self.outcomes.iter().find(|o| o.asset_id() == asset_id)
    }

    pub fn summary(&self) -> Vec<BatchSummaryRow> {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                AssetOutcome::Success(run) => BatchSummaryRow {
                    asset_id: run.asset_id.clone(),
                    success: true,
                    rows: run.table.len(),
                    valid_rows: run.table.valid_rows(),
                    latest_date: run.status.as_ref().map(|s| s.date),
                    composite_bri: run.status.as_ref().map(|s| s.composite_bri),
                    synthetic: run.is_synthetic(),
                    error: None,
                },
                AssetOutcome::Failure { asset_id, error } => BatchSummaryRow {
                    asset_id: asset_id.clone(),
                    success: false,
                    rows: 0,
                    valid_rows: 0,
                    latest_date: None,
                    composite_bri: None,
                    synthetic: false,
                    error: Some(error.clone()),
                },
            })
            .collect()
    }
}

/// Score every asset in parallel.
pub fn run_batch(
    assets: &[String],
    provider: &dyn PriceDataProvider,
    config: &BriConfig,
    opts: &BatchOptions,
) -> BatchReport {
    let started = Instant::now();
    let outcomes: Vec<AssetOutcome> = assets
        .par_iter()
        .map(|asset_id| run_asset(asset_id, provider, config, opts))
        .collect();

    let report = BatchReport {
        config_fingerprint: config.fingerprint(),
        outcomes,
    };
    info!(
        assets = assets.len(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch complete"
    );
    report
}

fn run_asset(
    asset_id: &str,
    provider: &dyn PriceDataProvider,
    config: &BriConfig,
    opts: &BatchOptions,
) -> AssetOutcome {
    let started = Instant::now();
    let result = load_series(asset_id, provider, opts.synthetic_fallback.as_ref()).and_then(
        |loaded| {
            let table = calculate_full_bri(&loaded.series, config)?;
            Ok((loaded, table))
        },
    );

    match result {
        Ok((loaded, table)) => {
            let status = current_status(&table);
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(
                asset = asset_id,
                rows = table.len(),
                valid_rows = table.valid_rows(),
                composite = status.as_ref().map(|s| s.composite_bri),
                elapsed_ms,
                "asset scored"
            );
            AssetOutcome::Success(Box::new(AssetRun {
                asset_id: asset_id.to_string(),
                source: loaded.source,
                dataset_hash: loaded.dataset_hash,
                table,
                status,
                elapsed_ms,
            }))
        }
        Err(e) => {
            warn!(asset = asset_id, error = %e, "asset failed");
            AssetOutcome::Failure {
                asset_id: asset_id.to_string(),
                error: e.to_string(),
            }
        }
    }
}
