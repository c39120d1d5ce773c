//! Incremental updates: recompute a warm tail, keep only the new rows.
//!
//! The caller stores results up to `known_last_date`. An update slices the
//! price history to `required_history()` rows on or before that date plus
//! everything after it, recomputes, and returns the rows strictly after
//! `known_last_date`. With outlier removal off, those rows equal what a full
//! recomputation would produce.

use bri_core::{calculate_full_bri, calculate_incremental, BriConfig, BriResultTable, PriceSeries};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::RunError;

/// What an update would do, before computing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCheck {
    /// Nothing stored yet: a full computation is needed.
    FirstTime { available_rows: usize },
    /// New price rows exist after the stored date.
    Incremental { new_rows: usize },
    /// No price rows after the stored date.
    UpToDate,
}

pub fn check_for_updates(prices: &PriceSeries, known_last_date: Option<NaiveDate>) -> UpdateCheck {
    match known_last_date {
        None => UpdateCheck::FirstTime {
            available_rows: prices.len(),
        },
        Some(date) => match prices.len() - prices.count_through(date) {
            0 => UpdateCheck::UpToDate,
            new_rows => UpdateCheck::Incremental { new_rows },
        },
    }
}

/// Rows to persist after an update.
#[derive(Debug, Clone)]
pub struct IncrementalUpdate {
    pub known_last_date: Option<NaiveDate>,
    /// First date of the recomputed window.
    pub window_start: Option<NaiveDate>,
    /// Only rows dated after `known_last_date` (all rows on a first run).
    pub rows: BriResultTable,
}

impl IncrementalUpdate {
    pub fn new_rows(&self) -> usize {
        self.rows.len()
    }
}

/// The slice of `prices` an update must recompute over.
pub fn warmup_slice(prices: &PriceSeries, config: &BriConfig, known_last_date: NaiveDate) -> PriceSeries {
    let through = prices.count_through(known_last_date);
    let keep = config.required_history().min(through) + (prices.len() - through);
    prices.tail(keep)
}

/// Update from a stored `known_last_date` (or `None` for a first run).
///
/// `force_full` recomputes the entire history but still returns only rows
/// after `known_last_date`.
pub fn update(
    prices: &PriceSeries,
    config: &BriConfig,
    known_last_date: Option<NaiveDate>,
    force_full: bool,
) -> Result<IncrementalUpdate, RunError> {
    if config.remove_outliers() {
        warn!("outlier removal uses whole-series statistics; incremental rows may differ from a full run");
    }

    let Some(known) = known_last_date else {
        info!(rows = prices.len(), "first run: full computation");
        let rows = calculate_full_bri(prices, config)?;
        return Ok(IncrementalUpdate {
            known_last_date,
            window_start: prices.first_date(),
            rows,
        });
    };

    let (window, table) = if force_full {
        (prices.clone(), calculate_full_bri(prices, config)?)
    } else {
        let window = warmup_slice(prices, config, known);
        let table = calculate_incremental(&window, config, known)?;
        (window, table)
    };

    let rows = table.rows_after(known);
    debug!(
        %known,
        window_rows = window.len(),
        new_rows = rows.len(),
        force_full,
        "incremental update"
    );

    Ok(IncrementalUpdate {
        known_last_date,
        window_start: window.first_date(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bri_core::config::{BriConfigSpec, HorizonConfig, WindowConfig};

    fn series(n: usize) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let dates = (0..n).map(|i| base + chrono::Duration::days(i as i64)).collect();
        let prices = (0..n)
            .map(|i| 100.0 + 5.0 * (i as f64 * 0.2).sin() + 0.05 * i as f64)
            .collect();
        PriceSeries::new(dates, prices).unwrap()
    }

    fn config() -> BriConfig {
        BriConfigSpec {
            windows: WindowConfig::new(
                HorizonConfig::new(5, 10).unwrap(),
                HorizonConfig::new(8, 15).unwrap(),
                HorizonConfig::new(10, 20).unwrap(),
            ),
            ..Default::default()
        }
        .build()
        .unwrap()
    }

    #[test]
    fn check_reports_update_kind() {
        let prices = series(50);
        assert_eq!(
            check_for_updates(&prices, None),
            UpdateCheck::FirstTime { available_rows: 50 }
        );
        assert_eq!(
            check_for_updates(&prices, Some(prices.dates()[44])),
            UpdateCheck::Incremental { new_rows: 5 }
        );
        assert_eq!(
            check_for_updates(&prices, prices.last_date()),
            UpdateCheck::UpToDate
        );
    }

    #[test]
    fn warmup_slice_keeps_required_history() {
        let prices = series(100);
        let config = config();
        let known = prices.dates()[89];
        let slice = warmup_slice(&prices, &config, known);
        assert_eq!(slice.len(), config.required_history() + 10);
        assert_eq!(slice.last_date(), prices.last_date());
    }

    #[test]
    fn update_matches_full_recomputation() {
        let prices = series(120);
        let config = config();
        let known = prices.dates()[109];

        let incremental = update(&prices, &config, Some(known), false).unwrap();
        let forced = update(&prices, &config, Some(known), true).unwrap();
        assert_eq!(incremental.new_rows(), 10);
        assert!(incremental.rows.bitwise_eq(&forced.rows));
        assert!(incremental.window_start > prices.first_date());
    }

    #[test]
    fn first_run_returns_everything() {
        let prices = series(40);
        let result = update(&prices, &config(), None, false).unwrap();
        assert_eq!(result.new_rows(), 40);
    }

    #[test]
    fn shallow_history_is_an_error() {
        let prices = series(30);
        let known = prices.dates()[5];
        let err = update(&prices, &config(), Some(known), false).unwrap_err();
        assert!(err.to_string().contains("warmup"));
    }
}
