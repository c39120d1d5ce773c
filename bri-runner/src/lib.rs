//! BRI Runner: orchestration around `bri-core`.
//!
//! This crate provides:
//! - Named configuration presets, built-in and TOML files on disk
//! - Price loading from CSV or Parquet with a tagged synthetic fallback
//! - Parallel multi-asset batches with per-asset failure isolation
//! - Incremental updates from a stored last date
//! - CSV and versioned JSON export
//! - `tracing` subscriber setup

pub mod batch;
pub mod data_loader;
pub mod export;
pub mod incremental;
pub mod logging;
pub mod presets;

use bri_core::{ConfigError, DataError};
use thiserror::Error;

pub use batch::{run_batch, AssetOutcome, AssetRun, BatchOptions, BatchReport, BatchSummaryRow};
pub use data_loader::{
    compute_dataset_hash, load_series, CsvPriceProvider, LoadedSeries, ParquetPriceProvider,
    SyntheticProvider,
};
pub use export::{
    export_csv, export_json, import_json, save_batch, write_csv, ResultDocument, SCHEMA_VERSION,
};
pub use incremental::{check_for_updates, update, warmup_slice, IncrementalUpdate, UpdateCheck};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use presets::PresetRegistry;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<AssetOutcome>();
        assert_sync::<AssetOutcome>();
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
    }

    #[test]
    fn providers_are_send_sync() {
        assert_send::<CsvPriceProvider>();
        assert_sync::<CsvPriceProvider>();
        assert_send::<ParquetPriceProvider>();
        assert_sync::<ParquetPriceProvider>();
        assert_send::<SyntheticProvider>();
        assert_sync::<SyntheticProvider>();
        assert_send::<PresetRegistry>();
        assert_sync::<PresetRegistry>();
    }

    #[test]
    fn run_error_is_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
