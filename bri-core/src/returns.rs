//! ReturnsProcessor: price series to return series, with an optional outlier filter.

use serde::{Deserialize, Serialize};

use crate::data::DataError;
use crate::stats;

/// How period returns are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMethod {
    /// `ln(p_t / p_{t-1})`
    Log,
    /// `p_t / p_{t-1} - 1`
    Simple,
}

/// Returns aligned to `prices`; the first element is always NaN.
///
/// Non-positive prices are not rejected and produce NaN/inf returns.
pub fn compute_returns(prices: &[f64], method: ReturnMethod) -> Result<Vec<f64>, DataError> {
    match prices.len() {
        0 => return Err(DataError::EmptySeries),
        1 => return Err(DataError::InsufficientPrices { len: 1 }),
        _ => {}
    }

    let mut out = Vec::with_capacity(prices.len());
    out.push(f64::NAN);
    for w in prices.windows(2) {
        let ratio = w[1] / w[0];
        out.push(match method {
            ReturnMethod::Log => ratio.ln(),
            ReturnMethod::Simple => ratio - 1.0,
        });
    }
    Ok(out)
}

/// Replace returns whose global z-score exceeds `threshold` with NaN.
///
/// The z-score uses the mean and population standard deviation of all
/// non-missing values. A zero-variance (or non-finite) series is returned
/// unchanged.
pub fn remove_outliers(returns: &[f64], threshold: f64) -> Vec<f64> {
    let valid: Vec<f64> = returns.iter().copied().filter(|r| !r.is_nan()).collect();
    let mean = stats::mean(&valid);
    let var = stats::variance(&valid, 0);

    if !var.is_finite() || stats::is_flat(mean, var) {
        return returns.to_vec();
    }

    let std = var.sqrt();
    let mut removed = 0usize;
    let filtered = returns
        .iter()
        .map(|&r| {
            if !r.is_nan() && ((r - mean) / std).abs() > threshold {
                removed += 1;
                f64::NAN
            } else {
                r
            }
        })
        .collect();

    if removed > 0 {
        tracing::debug!(removed, threshold, "outlier returns replaced with NaN");
    }
    filtered
}

/// Descriptive statistics of the non-missing values of a return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub variance: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

/// Summary statistics; std/variance are sample (ddof = 1), kurtosis is excess.
pub fn summary(returns: &[f64]) -> ReturnSummary {
    let mut valid: Vec<f64> = returns.iter().copied().filter(|r| !r.is_nan()).collect();
    let variance = stats::variance(&valid, 1);
    let mean = stats::mean(&valid);
    let skewness = stats::skewness(&valid);
    let kurtosis = stats::excess_kurtosis(&valid);

    valid.sort_by(f64::total_cmp);

    ReturnSummary {
        count: valid.len(),
        mean,
        std: variance.sqrt(),
        variance,
        skewness,
        kurtosis,
        min: valid.first().copied().unwrap_or(f64::NAN),
        max: valid.last().copied().unwrap_or(f64::NAN),
        p25: stats::quantile_sorted(&valid, 0.25),
        p50: stats::quantile_sorted(&valid, 0.50),
        p75: stats::quantile_sorted(&valid, 0.75),
    }
}
