//! Price data provider trait and structured data error types.
//!
//! The `PriceDataProvider` trait abstracts over where a price series comes
//! from (local files, a database, a synthetic generator) so the pipeline can
//! be fed and mocked without knowing about I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceSeries;

/// Data-shape errors. Fatal to the call that raised them.
///
/// Insufficient *history* is not an error: it shows up as NaN in the output.
/// These variants cover input that cannot be computed on at all.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("price column '{column}' not found")]
    MissingColumn { column: String },

    #[error("price series is empty")]
    EmptySeries,

    #[error("need at least 2 price points, got {len}")]
    InsufficientPrices { len: usize },

    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },

    #[error("date/price length mismatch: {dates} dates vs {prices} prices")]
    LengthMismatch { dates: usize, prices: usize },

    #[error(
        "incremental warmup too short: {available} rows on or before {known_last_date}, need {required}"
    )]
    InsufficientWarmup {
        known_last_date: NaiveDate,
        required: usize,
        available: usize,
    },

    #[error("null date at row {row}")]
    NullDate { row: usize },

    #[error("asset not found: {asset}")]
    AssetNotFound { asset: String },

    #[error("frame error: {0}")]
    Frame(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("column '{column}' has {len} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        len: usize,
        expected: usize,
    },
}

/// Where a price series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    CsvFile,
    ParquetFile,
    InMemory,
    Synthetic,
}

/// Source of price series, keyed by asset id.
///
/// Implementations own fetching, retries and caching; the core only ever sees
/// the resulting `PriceSeries`.
pub trait PriceDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the full date-ordered price series for an asset.
    fn fetch(&self, asset_id: &str) -> Result<PriceSeries, DataError>;

    /// Provenance tag attached to results computed from this provider.
    fn source(&self) -> DataSource;
}

/// Provider backed by series already held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProvider {
    series: std::collections::BTreeMap<String, PriceSeries>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, asset_id: impl Into<String>, series: PriceSeries) -> Self {
        self.series.insert(asset_id.into(), series);
        self
    }

    pub fn insert(&mut self, asset_id: impl Into<String>, series: PriceSeries) {
        self.series.insert(asset_id.into(), series);
    }

    pub fn asset_ids(&self) -> Vec<&str> {
        self.series.keys().map(|k| k.as_str()).collect()
    }
}

impl PriceDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn fetch(&self, asset_id: &str) -> Result<PriceSeries, DataError> {
        self.series
            .get(asset_id)
            .cloned()
            .ok_or_else(|| DataError::AssetNotFound {
                asset: asset_id.to_string(),
            })
    }

    fn source(&self) -> DataSource {
        DataSource::InMemory
    }
}
