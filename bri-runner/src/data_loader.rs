//! Price loading for the runner.
//!
//! Providers:
//! - `CsvPriceProvider`: `<dir>/<asset>.csv` with a date column and a named price column
//! - `ParquetPriceProvider`: `<dir>/<asset>.parquet`, read through polars
//! - `SyntheticProvider`: deterministic random walk seeded from the asset id
//!
//! `load_series` applies the fallback policy:
//! 1. If the primary provider has the asset → use it
//! 2. If not and synthetic fallback is enabled → generate (tagged, logged)
//! 3. Otherwise → fail with the provider's error
//!
//! Synthetic data is a developer-only mode; results computed on it carry
//! `DataSource::Synthetic`.

use std::fs::File;
use std::path::{Path, PathBuf};

use bri_core::data::{price_series_from_frame, DataError, DataSource, PriceDataProvider};
use bri_core::PriceSeries;
use chrono::{Datelike, NaiveDate};
use polars::prelude::{ParquetReader, SerReader};

/// Date formats accepted in CSV files, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Timestamps like "2024-01-02 00:00:00" keep only the date part.
    let raw = raw.split([' ', 'T']).next().unwrap_or(raw).trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_price(raw: &str) -> f64 {
    match raw.trim() {
        "" | "null" | "NULL" | "NaN" | "nan" | "NA" => f64::NAN,
        s => s.parse().unwrap_or(f64::NAN),
    }
}

// ─── CSV ─────────────────────────────────────────────────────────────

/// Reads `<dir>/<asset>.csv`.
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    dir: PathBuf,
    date_column: String,
    price_column: String,
}

impl CsvPriceProvider {
    /// Defaults to a `Date` column and a `Close` price column.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            date_column: "Date".to_string(),
            price_column: "Close".to_string(),
        }
    }

    pub fn with_columns(mut self, date_column: &str, price_column: &str) -> Self {
        self.date_column = date_column.to_string();
        self.price_column = price_column.to_string();
        self
    }

    pub fn path_for(&self, asset_id: &str) -> PathBuf {
        self.dir.join(format!("{asset_id}.csv"))
    }

    /// Parse a CSV file with the configured columns.
    pub fn read_file(&self, path: &Path) -> Result<PriceSeries, DataError> {
        let mut reader =
            csv::Reader::from_path(path).map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;

        let headers = reader
            .headers()
            .map_err(|e| DataError::Csv(e.to_string()))?
            .clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DataError::MissingColumn {
                    column: name.to_string(),
                })
        };
        let date_idx = find(&self.date_column)?;
        let price_idx = find(&self.price_column)?;

        let mut dates = Vec::new();
        let mut prices = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| DataError::Csv(e.to_string()))?;
            let raw_date = record.get(date_idx).unwrap_or("");
            let date = parse_date(raw_date).ok_or_else(|| {
                DataError::Csv(format!("row {row}: unparseable date '{raw_date}'"))
            })?;
            dates.push(date);
            prices.push(parse_price(record.get(price_idx).unwrap_or("")));
        }

        if dates.is_empty() {
            return Err(DataError::EmptySeries);
        }
        PriceSeries::new(dates, prices)
    }
}

impl PriceDataProvider for CsvPriceProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, asset_id: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(asset_id);
        if !path.exists() {
            return Err(DataError::AssetNotFound {
                asset: asset_id.to_string(),
            });
        }
        self.read_file(&path)
    }

    fn source(&self) -> DataSource {
        DataSource::CsvFile
    }
}

// ─── Parquet ─────────────────────────────────────────────────────────

/// Reads `<dir>/<asset>.parquet`.
#[derive(Debug, Clone)]
pub struct ParquetPriceProvider {
    dir: PathBuf,
    date_column: String,
    price_column: String,
}

impl ParquetPriceProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            date_column: "date".to_string(),
            price_column: "close".to_string(),
        }
    }

    pub fn with_columns(mut self, date_column: &str, price_column: &str) -> Self {
        self.date_column = date_column.to_string();
        self.price_column = price_column.to_string();
        self
    }
}

impl PriceDataProvider for ParquetPriceProvider {
    fn name(&self) -> &str {
        "parquet"
    }

    fn fetch(&self, asset_id: &str) -> Result<PriceSeries, DataError> {
        let path = self.dir.join(format!("{asset_id}.parquet"));
        let file = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DataError::AssetNotFound {
                asset: asset_id.to_string(),
            },
            _ => DataError::Io(format!("{}: {e}", path.display())),
        })?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| DataError::Frame(format!("{}: {e}", path.display())))?;
        price_series_from_frame(&df, &self.date_column, &self.price_column)
    }

    fn source(&self) -> DataSource {
        DataSource::ParquetFile
    }
}

// ─── Synthetic ───────────────────────────────────────────────────────

/// Deterministic weekday random walk from 100.0, seeded by the asset id.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start: NaiveDate,
    end: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl PriceDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, asset_id: &str) -> Result<PriceSeries, DataError> {
        let series = generate_synthetic_series(asset_id, self.start, self.end)?;
        if series.is_empty() {
            return Err(DataError::EmptySeries);
        }
        Ok(series)
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }
}

fn generate_synthetic_series(
    asset_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, DataError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(asset_id.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut dates = Vec::new();
    let mut prices = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            price *= 1.0 + daily_return;
            dates.push(current);
            prices.push(price);
        }
        current += chrono::Duration::days(1);
    }

    PriceSeries::new(dates, prices)
}

// ─── Fallback policy ─────────────────────────────────────────────────

/// A loaded series with provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub asset_id: String,
    pub series: PriceSeries,
    pub source: DataSource,
    /// BLAKE3 over dates and prices.
    pub dataset_hash: String,
}

impl LoadedSeries {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Load one asset from `primary`, falling back to `synthetic` when given.
pub fn load_series(
    asset_id: &str,
    primary: &dyn PriceDataProvider,
    synthetic: Option<&SyntheticProvider>,
) -> Result<LoadedSeries, DataError> {
    let (series, source) = match primary.fetch(asset_id) {
        Ok(series) => (series, primary.source()),
        Err(e) => match synthetic {
            Some(fallback) => {
                tracing::warn!(
                    asset = asset_id,
                    provider = primary.name(),
                    error = %e,
                    "generating synthetic data; results will be tagged as synthetic"
                );
                (fallback.fetch(asset_id)?, fallback.source())
            }
            None => return Err(e),
        },
    };

    Ok(LoadedSeries {
        asset_id: asset_id.to_string(),
        dataset_hash: compute_dataset_hash(&series),
        series,
        source,
    })
}

/// Deterministic BLAKE3 hash over a series' dates and prices.
pub fn compute_dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for (date, price) in series.dates().iter().zip(series.prices()) {
        hasher.update(date.to_string().as_bytes());
        hasher.update(&price.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(format!("{name}.csv")), body).unwrap();
    }

    #[test]
    fn reads_named_price_column() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "SPY",
            "Date,Open,Close\n2024-01-02,1,100.5\n2024-01-03,1,\n2024-01-04 00:00:00,1,101.0\n",
        );
        let series = CsvPriceProvider::new(dir.path()).fetch("SPY").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.prices()[0], 100.5);
        assert!(series.prices()[1].is_nan());
        assert_eq!(
            series.last_date(),
            NaiveDate::from_ymd_opt(2024, 1, 4)
        );
    }

    #[test]
    fn missing_price_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "SPY", "Date,Open\n2024-01-02,1\n");
        let err = CsvPriceProvider::new(dir.path()).fetch("SPY").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column } if column == "Close"));
    }

    #[test]
    fn unsorted_csv_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "X", "Date,Close\n2024-01-03,1\n2024-01-02,2\n");
        let err = CsvPriceProvider::new(dir.path()).fetch("X").unwrap_err();
        assert!(matches!(err, DataError::UnorderedDates { .. }));
    }

    #[test]
    fn missing_file_is_asset_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvPriceProvider::new(dir.path()).fetch("NOPE").unwrap_err();
        assert!(matches!(err, DataError::AssetNotFound { .. }));
    }

    #[test]
    fn synthetic_is_deterministic_and_skips_weekends() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let provider = SyntheticProvider::new(start, end);
        let a = provider.fetch("SPY").unwrap();
        let b = provider.fetch("SPY").unwrap();
        let c = provider.fetch("QQQ").unwrap();
        assert_eq!(a, b);
        assert_ne!(a.prices(), c.prices());
        assert!(a
            .dates()
            .iter()
            .all(|d| d.weekday() != chrono::Weekday::Sat && d.weekday() != chrono::Weekday::Sun));
    }

    #[test]
    fn fallback_tags_synthetic() {
        let dir = tempfile::tempdir().unwrap();
        let csv = CsvPriceProvider::new(dir.path());
        let synthetic = SyntheticProvider::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );

        assert!(load_series("SPY", &csv, None).is_err());

        let loaded = load_series("SPY", &csv, Some(&synthetic)).unwrap();
        assert!(loaded.is_synthetic());
        assert_eq!(loaded.dataset_hash, compute_dataset_hash(&loaded.series));
    }
}
