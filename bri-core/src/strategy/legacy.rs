//! Legacy z-score methodology.
//!
//! Per horizon, the rolling mean, variance, skewness and excess kurtosis of
//! returns over `moment_window` are each normalized over the whole series,
//! then combined with `MomentWeights` taken in (returns→mean,
//! volatility→variance, momentum→skewness, fragility→kurtosis) order. The
//! score is classified against `BubbleThresholds`.
//!
//! The thresholds are described as standard deviations but are compared with
//! a weighted sum of z-scores, which is not in those units. This comparison is
//! kept unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ScoringStrategy;
use crate::config::{BriConfig, BubbleThresholds};
use crate::data::DataError;
use crate::domain::{Horizon, PriceSeries};
use crate::moments::rolling;
use crate::returns::{compute_returns, remove_outliers};
use crate::stats;

/// Classification of a legacy score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Normal,
    Warning,
    Bubble,
    Extreme,
}

impl RiskLevel {
    /// Highest level whose threshold the score reaches. `None` for NaN.
    pub fn classify(score: f64, thresholds: &BubbleThresholds) -> Option<RiskLevel> {
        if score.is_nan() {
            None
        } else if score >= thresholds.extreme() {
            Some(RiskLevel::Extreme)
        } else if score >= thresholds.bubble() {
            Some(RiskLevel::Bubble)
        } else if score >= thresholds.warning() {
            Some(RiskLevel::Warning)
        } else {
            Some(RiskLevel::Normal)
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Normal => "Normal",
            RiskLevel::Warning => "Warning",
            RiskLevel::Bubble => "Bubble",
            RiskLevel::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole-series normalization applied to each raw moment series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// `(x - mean) / std`, sample std.
    #[default]
    ZScore,
    /// `(x - min) / (max - min)`.
    MinMax,
    /// `(x - median) / IQR`; `x - median` when the IQR is zero.
    Robust,
}

impl NormalizationMethod {
    /// Normalize over the non-missing values; NaN stays NaN.
    pub fn apply(self, values: &[f64]) -> Vec<f64> {
        let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let (center, scale) = match self {
            NormalizationMethod::ZScore => (stats::mean(&valid), stats::std_dev(&valid, 1)),
            NormalizationMethod::MinMax => {
                let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
                let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }
            NormalizationMethod::Robust => {
                valid.sort_by(f64::total_cmp);
                let median = stats::quantile_sorted(&valid, 0.5);
                let iqr = stats::quantile_sorted(&valid, 0.75) - stats::quantile_sorted(&valid, 0.25);
                (median, if iqr == 0.0 { 1.0 } else { iqr })
            }
        };

        if !(scale > 0.0) || !scale.is_finite() {
            return vec![f64::NAN; values.len()];
        }
        values.iter().map(|v| (v - center) / scale).collect()
    }
}

/// Legacy results for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyHorizonScore {
    pub horizon: Horizon,
    pub mean_raw: Vec<f64>,
    pub variance_raw: Vec<f64>,
    pub skewness_raw: Vec<f64>,
    pub kurtosis_raw: Vec<f64>,
    pub mean_norm: Vec<f64>,
    pub variance_norm: Vec<f64>,
    pub skewness_norm: Vec<f64>,
    pub kurtosis_norm: Vec<f64>,
    pub score: Vec<f64>,
    pub risk_level: Vec<Option<RiskLevel>>,
}

/// Output of `LegacyZScoreStrategy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyScoreTable {
    pub dates: Vec<NaiveDate>,
    pub price: Vec<f64>,
    pub returns: Vec<f64>,
    pub horizons: [LegacyHorizonScore; 3],
    pub composite_score: Vec<f64>,
    pub composite_risk_level: Vec<Option<RiskLevel>>,
}

impl LegacyScoreTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn horizon(&self, horizon: Horizon) -> &LegacyHorizonScore {
        &self.horizons[horizon.index()]
    }

    /// Date, composite score and level of the last row with a composite score.
    pub fn latest(&self) -> Option<(NaiveDate, f64, RiskLevel)> {
        let i = self.composite_score.iter().rposition(|v| !v.is_nan())?;
        Some((self.dates[i], self.composite_score[i], self.composite_risk_level[i]?))
    }
}

/// Z-score-normalized distribution moments, classified by thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyZScoreStrategy {
    normalization: NormalizationMethod,
}

impl LegacyZScoreStrategy {
    pub fn new(normalization: NormalizationMethod) -> Self {
        Self { normalization }
    }

    pub fn normalization(&self) -> NormalizationMethod {
        self.normalization
    }

    fn score_horizon(&self, horizon: Horizon, returns: &[f64], config: &BriConfig) -> LegacyHorizonScore {
        let window = config.horizon(horizon).moment_window();
        let min_periods = config.min_periods(window);

        let mean_raw = rolling::rolling_mean(returns, window, min_periods);
        let variance_raw = rolling::rolling_var(returns, window, min_periods);
        let skewness_raw = rolling::rolling_skew(returns, window, min_periods);
        let kurtosis_raw = rolling::rolling_kurt(returns, window, min_periods);

        let mean_norm = self.normalization.apply(&mean_raw);
        let variance_norm = self.normalization.apply(&variance_raw);
        let skewness_norm = self.normalization.apply(&skewness_raw);
        let kurtosis_norm = self.normalization.apply(&kurtosis_raw);

        let [w_mean, w_var, w_skew, w_kurt] = config.weights().as_array();
        let score: Vec<f64> = (0..returns.len())
            .map(|i| {
                w_mean * mean_norm[i]
                    + w_var * variance_norm[i]
                    + w_skew * skewness_norm[i]
                    + w_kurt * kurtosis_norm[i]
            })
            .collect();
        let risk_level = score
            .iter()
            .map(|s| RiskLevel::classify(*s, config.thresholds()))
            .collect();

        LegacyHorizonScore {
            horizon,
            mean_raw,
            variance_raw,
            skewness_raw,
            kurtosis_raw,
            mean_norm,
            variance_norm,
            skewness_norm,
            kurtosis_norm,
            score,
            risk_level,
        }
    }
}

impl ScoringStrategy for LegacyZScoreStrategy {
    type Output = LegacyScoreTable;

    fn name(&self) -> &str {
        "legacy_zscore"
    }

    fn score(&self, prices: &PriceSeries, config: &BriConfig) -> Result<LegacyScoreTable, DataError> {
        let raw = compute_returns(prices.prices(), config.return_method())?;
        let returns = if config.remove_outliers() {
            remove_outliers(&raw, config.outlier_threshold())
        } else {
            raw
        };

        let horizons = Horizon::ALL.map(|h| self.score_horizon(h, &returns, config));
        let composite_score = crate::composite::composite(
            &horizons[0].score,
            &horizons[1].score,
            &horizons[2].score,
        );
        let composite_risk_level = composite_score
            .iter()
            .map(|s| RiskLevel::classify(*s, config.thresholds()))
            .collect();

        Ok(LegacyScoreTable {
            dates: prices.dates().to_vec(),
            price: prices.prices().to_vec(),
            returns,
            horizons,
            composite_score,
            composite_risk_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn classification_boundaries_are_inclusive() {
        let t = BubbleThresholds::default();
        assert_eq!(RiskLevel::classify(1.49, &t), Some(RiskLevel::Normal));
        assert_eq!(RiskLevel::classify(1.5, &t), Some(RiskLevel::Warning));
        assert_eq!(RiskLevel::classify(2.0, &t), Some(RiskLevel::Bubble));
        assert_eq!(RiskLevel::classify(2.5, &t), Some(RiskLevel::Extreme));
        assert_eq!(RiskLevel::classify(f64::NAN, &t), None);
        assert_eq!(RiskLevel::Bubble.code(), 2);
    }

    #[test]
    fn zscore_normalization() {
        let z = NormalizationMethod::ZScore.apply(&[f64::NAN, 1.0, 2.0, 3.0]);
        assert!(z[0].is_nan());
        assert_approx(z[1], -1.0, DEFAULT_EPSILON);
        assert_approx(z[2], 0.0, DEFAULT_EPSILON);
        assert_approx(z[3], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn minmax_and_robust_normalization() {
        let m = NormalizationMethod::MinMax.apply(&[2.0, 4.0, 6.0]);
        assert_eq!(m, vec![0.0, 0.5, 1.0]);
        // median 2, q25 1.5, q75 2.5
        let r = NormalizationMethod::Robust.apply(&[1.0, 2.0, 3.0]);
        assert_approx(r[0], -1.0, DEFAULT_EPSILON);
        assert_approx(r[2], 1.0, DEFAULT_EPSILON);
        // zero IQR falls back to centering only
        let flat = NormalizationMethod::Robust.apply(&[5.0, 5.0, 5.0, 5.0, 7.0]);
        assert_approx(flat[4], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_series_normalizes_to_missing() {
        assert!(NormalizationMethod::ZScore
            .apply(&[1.0, 1.0, 1.0])
            .iter()
            .all(|v| v.is_nan()));
    }
}
