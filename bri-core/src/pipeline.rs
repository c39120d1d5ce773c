//! Pipeline entry points: full recomputation, frame input, incremental runs.
//!
//! ```text
//! prices ─► returns ─► (outliers) ─┬─► MomentEngine ─► PercentileRanker ×4 ─► HorizonAggregator  (short)
//!                                  ├─► …                                                         (mid)
//!                                  └─► …                                                         (long)
//!                                                          └──────────────► composite ─► table
//! ```

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::debug;

use crate::composite::composite;
use crate::config::BriConfig;
use crate::data::{price_series_from_frame, DataError};
use crate::domain::{Horizon, Moment, PriceSeries};
use crate::horizon::{HorizonAggregator, HorizonColumns};
use crate::moments::MomentEngine;
use crate::percentile::percentile_rank;
use crate::returns::{compute_returns, remove_outliers};
use crate::strategy::ScoringStrategy;
use crate::table::BriResultTable;

/// Cold-start computation over the full price history.
///
/// Insufficient history never fails: rows that cannot be scored are NaN.
pub fn calculate_full_bri(
    prices: &PriceSeries,
    config: &BriConfig,
) -> Result<BriResultTable, DataError> {
    let raw = compute_returns(prices.prices(), config.return_method())?;
    let returns = if config.remove_outliers() {
        remove_outliers(&raw, config.outlier_threshold())
    } else {
        raw
    };

    let aggregator = HorizonAggregator::new(*config.weights(), config.scaling_mode());
    let horizons =
        Horizon::ALL.map(|h| score_horizon(h, prices.prices(), &returns, config, &aggregator));

    let composite_bri = composite(
        &horizons[0].indicator,
        &horizons[1].indicator,
        &horizons[2].indicator,
    );

    let table = BriResultTable::new(
        prices.dates().to_vec(),
        prices.prices().to_vec(),
        returns,
        horizons,
        composite_bri,
        config.fingerprint(),
    );
    debug!(
        rows = table.len(),
        valid_rows = table.valid_rows(),
        "BRI table computed"
    );
    Ok(table)
}

/// `calculate_full_bri` over a polars frame with named date and price columns.
pub fn calculate_full_bri_from_frame(
    df: &DataFrame,
    date_column: &str,
    price_column: &str,
    config: &BriConfig,
) -> Result<BriResultTable, DataError> {
    let prices = price_series_from_frame(df, date_column, price_column)?;
    calculate_full_bri(&prices, config)
}

/// Recompute over `prices_with_warmup` for an incremental update.
///
/// Returns the full recomputed table; the caller keeps `rows_after(known_last_date)`.
/// Fails with `InsufficientWarmup` when fewer than `max(percentile_lookback)`
/// rows are dated on or before `known_last_date`. Rows reproduce a cold run
/// exactly only when at least `config.required_history()` rows precede them
/// and outlier removal is off.
pub fn calculate_incremental(
    prices_with_warmup: &PriceSeries,
    config: &BriConfig,
    known_last_date: NaiveDate,
) -> Result<BriResultTable, DataError> {
    let available = prices_with_warmup.count_through(known_last_date);
    let required = config.max_percentile_lookback();
    if available < required {
        return Err(DataError::InsufficientWarmup {
            known_last_date,
            required,
            available,
        });
    }
    debug!(
        %known_last_date,
        warmup_rows = available,
        new_rows = prices_with_warmup.len() - available,
        "incremental recomputation"
    );
    calculate_full_bri(prices_with_warmup, config)
}

/// Score a series with an explicit strategy.
pub fn calculate_with<S: ScoringStrategy>(
    strategy: &S,
    prices: &PriceSeries,
    config: &BriConfig,
) -> Result<S::Output, DataError> {
    debug!(strategy = strategy.name(), "scoring");
    strategy.score(prices, config)
}

fn score_horizon(
    horizon: Horizon,
    prices: &[f64],
    returns: &[f64],
    config: &BriConfig,
    aggregator: &HorizonAggregator,
) -> HorizonColumns {
    let hc = config.horizon(horizon);
    let engine = MomentEngine::new(
        hc.moment_window(),
        config.min_periods(hc.moment_window()),
        config.return_method(),
    );
    debug!(
        %horizon,
        moment_window = hc.moment_window(),
        percentile_lookback = hc.percentile_lookback(),
        min_periods = engine.min_periods(),
        "scoring horizon"
    );

    let moments = engine.compute(prices, returns);
    let pctiles = Moment::ALL.map(|m| {
        percentile_rank(
            moments.value(m),
            hc.percentile_lookback(),
            config.min_periods_ratio(),
        )
    });
    aggregator.aggregate(moments, pctiles)
}
