//! MomentEngine: the four raw moments of one horizon.
//!
//! | moment     | definition over the trailing window                         |
//! |------------|-------------------------------------------------------------|
//! | returns    | Σ log returns, or ∏(1 + r) − 1 for simple returns           |
//! | volatility | sample std (ddof = 1) × √252, needs 2 valid observations    |
//! | momentum   | (price − moving_avg_price) / moving_avg_price × 100         |
//! | fragility  | realized_vol − realized_mad                                 |
//!
//! A row is NaN unless its window holds at least `min_periods` valid
//! observations.

pub mod rolling;

use serde::{Deserialize, Serialize};

use crate::domain::Moment;
use crate::returns::ReturnMethod;

/// Trading days per year, used to annualize volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Raw moment series and their intermediates for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonMoments {
    pub returns_value: Vec<f64>,
    pub volatility_value: Vec<f64>,
    pub momentum_value: Vec<f64>,
    pub fragility_value: Vec<f64>,
    pub moving_avg_price: Vec<f64>,
    pub realized_vol: Vec<f64>,
    pub realized_mad: Vec<f64>,
}

impl HorizonMoments {
    pub fn len(&self) -> usize {
        self.returns_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns_value.is_empty()
    }

    pub fn value(&self, moment: Moment) -> &[f64] {
        match moment {
            Moment::Returns => &self.returns_value,
            Moment::Volatility => &self.volatility_value,
            Moment::Momentum => &self.momentum_value,
            Moment::Fragility => &self.fragility_value,
        }
    }
}

/// Computes the moment set for one horizon's window.
#[derive(Debug, Clone)]
pub struct MomentEngine {
    window: usize,
    min_periods: usize,
    method: ReturnMethod,
}

impl MomentEngine {
    pub fn new(window: usize, min_periods: usize, method: ReturnMethod) -> Self {
        Self {
            window,
            min_periods: min_periods.max(1),
            method,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    /// `prices` and `returns` are aligned, one value per date.
    pub fn compute(&self, prices: &[f64], returns: &[f64]) -> HorizonMoments {
        debug_assert_eq!(prices.len(), returns.len());

        let returns_value = self.returns_moment(returns);
        let realized_vol = self.volatility(returns);
        let realized_mad = rolling::rolling_mad(returns, self.window, self.min_periods);
        let moving_avg_price = rolling::rolling_mean(prices, self.window, self.min_periods);

        let momentum_value = prices
            .iter()
            .zip(&moving_avg_price)
            .map(|(&p, &ma)| {
                if ma == 0.0 {
                    f64::NAN
                } else {
                    (p - ma) / ma * 100.0
                }
            })
            .collect();

        let fragility_value = realized_vol
            .iter()
            .zip(&realized_mad)
            .map(|(vol, mad)| vol - mad)
            .collect();

        HorizonMoments {
            returns_value,
            volatility_value: realized_vol.clone(),
            momentum_value,
            fragility_value,
            moving_avg_price,
            realized_vol,
            realized_mad,
        }
    }

    fn returns_moment(&self, returns: &[f64]) -> Vec<f64> {
        match self.method {
            ReturnMethod::Log => rolling::rolling_sum(returns, self.window, self.min_periods),
            ReturnMethod::Simple => {
                rolling::rolling_compound(returns, self.window, self.min_periods)
            }
        }
    }

    fn volatility(&self, returns: &[f64]) -> Vec<f64> {
        let annualize = TRADING_DAYS_PER_YEAR.sqrt();
        rolling::rolling_std(returns, self.window, self.min_periods)
            .into_iter()
            .map(|s| s * annualize)
            .collect()
    }
}

/// Series of price-derived values for tests: prices as given, dates consecutive.
#[cfg(test)]
pub fn make_series(prices: &[f64]) -> crate::domain::PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let dates = (0..prices.len())
        .map(|i| base_date + chrono::Duration::days(i as i64))
        .collect();
    crate::domain::PriceSeries::new(dates, prices.to_vec()).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for numeric tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::returns::compute_returns;

    fn engine(window: usize, min_periods: usize) -> MomentEngine {
        MomentEngine::new(window, min_periods, ReturnMethod::Log)
    }

    #[test]
    fn log_returns_moment_telescopes() {
        let prices = [100.0, 110.0, 121.0, 133.1];
        let returns = compute_returns(&prices, ReturnMethod::Log).unwrap();
        let m = engine(3, 2).compute(&prices, &returns);
        // window [1, 3] of returns sums to ln(133.1 / 100)
        assert_approx(m.returns_value[3], (133.1f64 / 100.0).ln(), 1e-12);
        // window [0, 1] holds a single valid return
        assert!(m.returns_value[1].is_nan());
        assert_approx(m.returns_value[2], (121.0f64 / 100.0).ln(), 1e-12);
    }

    #[test]
    fn simple_returns_moment_compounds() {
        let prices = [100.0, 110.0, 121.0];
        let returns = compute_returns(&prices, ReturnMethod::Simple).unwrap();
        let m = MomentEngine::new(3, 2, ReturnMethod::Simple).compute(&prices, &returns);
        assert_approx(m.returns_value[2], 0.21, 1e-12);
    }

    #[test]
    fn volatility_is_annualized_sample_std() {
        let prices = [100.0, 101.0, 99.0, 102.0, 100.0];
        let returns = compute_returns(&prices, ReturnMethod::Log).unwrap();
        let m = engine(4, 2).compute(&prices, &returns);
        let expected = crate::stats::std_dev(&returns[1..5], 1) * 252f64.sqrt();
        assert_approx(m.volatility_value[4], expected, DEFAULT_EPSILON);
        assert_eq!(m.volatility_value[4].to_bits(), m.realized_vol[4].to_bits());
    }

    #[test]
    fn momentum_against_moving_average() {
        let prices = [10.0, 10.0, 10.0, 13.0];
        let returns = compute_returns(&prices, ReturnMethod::Log).unwrap();
        let m = engine(4, 1).compute(&prices, &returns);
        assert_approx(m.moving_avg_price[3], 10.75, DEFAULT_EPSILON);
        assert_approx(m.momentum_value[3], (13.0 - 10.75) / 10.75 * 100.0, DEFAULT_EPSILON);
        assert_approx(m.momentum_value[0], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn fragility_is_vol_minus_mad() {
        let prices = [100.0, 102.0, 99.0, 104.0, 101.0, 103.0];
        let returns = compute_returns(&prices, ReturnMethod::Log).unwrap();
        let m = engine(5, 3).compute(&prices, &returns);
        for i in 0..prices.len() {
            let expected = m.realized_vol[i] - m.realized_mad[i];
            if expected.is_nan() {
                assert!(m.fragility_value[i].is_nan());
            } else {
                assert_approx(m.fragility_value[i], expected, DEFAULT_EPSILON);
            }
        }
        assert!(!m.fragility_value[5].is_nan());
    }

    #[test]
    fn insufficient_history_is_missing_not_error() {
        let prices = [100.0, 101.0];
        let returns = compute_returns(&prices, ReturnMethod::Log).unwrap();
        let m = engine(63, 50).compute(&prices, &returns);
        assert!(m.returns_value.iter().all(|v| v.is_nan()));
        assert!(m.momentum_value.iter().all(|v| v.is_nan()));
    }
}
