//! Trailing-window primitives over NaN-bearing series.
//!
//! The window ending at `i` is `[max(0, i + 1 - window), i]`, so the first
//! rows see a partial window and are gated by `min_periods` alone. Each
//! window is re-aggregated from its own contents in index order; no running
//! sums are carried between rows.

use crate::stats;

/// First index of the trailing window ending at `i`.
#[inline]
pub fn window_start(i: usize, window: usize) -> usize {
    (i + 1).saturating_sub(window)
}

/// Apply `f` to the valid values of every trailing window holding at least
/// `min_periods` of them; other rows are NaN.
pub fn rolling_apply<F>(values: &[f64], window: usize, min_periods: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 {
        return out;
    }

    let mut valid = Vec::with_capacity(window);
    for (i, slot) in out.iter_mut().enumerate() {
        valid.clear();
        valid.extend(
            values[window_start(i, window)..=i]
                .iter()
                .copied()
                .filter(|v| !v.is_nan()),
        );
        if valid.len() >= min_periods.max(1) {
            *slot = f(&valid);
        }
    }
    out
}

/// Rolling sum of valid values.
pub fn rolling_sum(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods, |w| w.iter().sum())
}

/// Rolling compounded return `∏(1 + r) - 1` of valid simple returns.
pub fn rolling_compound(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods, |w| {
        w.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
    })
}

/// Rolling mean of valid values.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods, stats::mean)
}

/// Rolling sample standard deviation (ddof = 1); needs 2 valid values.
pub fn rolling_std(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods.max(2), |w| stats::std_dev(w, 1))
}

/// Rolling sample variance (ddof = 1); needs 2 valid values.
pub fn rolling_var(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods.max(2), |w| stats::variance(w, 1))
}

/// Rolling mean absolute deviation around the window mean.
pub fn rolling_mad(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods, stats::mean_abs_deviation)
}

/// Rolling bias-corrected skewness; needs 3 valid values.
pub fn rolling_skew(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods.max(3), stats::skewness)
}

/// Rolling bias-corrected excess kurtosis; needs 4 valid values.
pub fn rolling_kurt(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(values, window, min_periods.max(4), stats::excess_kurtosis)
}
