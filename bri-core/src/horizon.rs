//! HorizonAggregator: weighted percentile average times a scaling factor.

use serde::{Deserialize, Serialize};

use crate::config::MomentWeights;
use crate::domain::Moment;
use crate::moments::HorizonMoments;

/// How the averaged percentile is scaled into a horizon indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScalingMode {
    /// Constant 0.5.
    Static,
    /// Logistic in the volatility-normalized return.
    Dynamic { steepness: f64 },
}

/// Smallest distance the scaling factor keeps from 0 and 1.
pub const SCALING_MARGIN: f64 = f64::EPSILON;

/// Logistic squashing `1 / (1 + exp(-k·x))`: 0.5 at `x = 0`.
///
/// Saturates once `|k·x|` passes ~37, so the result is clamped to
/// `[SCALING_MARGIN, 1 - SCALING_MARGIN]` to stay inside (0, 1).
pub fn logistic(normalized_return: f64, steepness: f64) -> f64 {
    let s = 1.0 / (1.0 + (-steepness * normalized_return).exp());
    s.clamp(SCALING_MARGIN, 1.0 - SCALING_MARGIN)
}

/// `returns_value / volatility_value`, 0 when volatility is not positive.
/// NaN when either input is NaN.
pub fn normalized_return(returns_value: f64, volatility_value: f64) -> f64 {
    if returns_value.is_nan() || volatility_value.is_nan() {
        f64::NAN
    } else if volatility_value > 0.0 {
        returns_value / volatility_value
    } else {
        0.0
    }
}

impl ScalingMode {
    pub fn factor(&self, returns_value: f64, volatility_value: f64) -> f64 {
        match *self {
            ScalingMode::Static => 0.5,
            ScalingMode::Dynamic { steepness } => {
                logistic(normalized_return(returns_value, volatility_value), steepness)
            }
        }
    }
}

/// Everything computed for one horizon: raw moments, ranks, and the indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonColumns {
    pub moments: HorizonMoments,
    pub returns_pctile: Vec<f64>,
    pub volatility_pctile: Vec<f64>,
    pub momentum_pctile: Vec<f64>,
    pub fragility_pctile: Vec<f64>,
    pub avg_percentile: Vec<f64>,
    pub scaling_factor: Vec<f64>,
    pub indicator: Vec<f64>,
}

impl HorizonColumns {
    pub fn len(&self) -> usize {
        self.indicator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicator.is_empty()
    }

    pub fn pctile(&self, moment: Moment) -> &[f64] {
        match moment {
            Moment::Returns => &self.returns_pctile,
            Moment::Volatility => &self.volatility_pctile,
            Moment::Momentum => &self.momentum_pctile,
            Moment::Fragility => &self.fragility_pctile,
        }
    }
}

/// Combines four percentile series into one horizon indicator.
#[derive(Debug, Clone, Copy)]
pub struct HorizonAggregator {
    weights: MomentWeights,
    scaling: ScalingMode,
}

impl HorizonAggregator {
    pub fn new(weights: MomentWeights, scaling: ScalingMode) -> Self {
        Self { weights, scaling }
    }

    /// `pctiles` in (returns, volatility, momentum, fragility) order.
    pub fn aggregate(&self, moments: HorizonMoments, pctiles: [Vec<f64>; 4]) -> HorizonColumns {
        let n = moments.len();
        let w = self.weights.as_array();

        let avg_percentile: Vec<f64> = (0..n)
            .map(|i| {
                // NaN in any rank makes the sum NaN.
                w[0] * pctiles[0][i] + w[1] * pctiles[1][i] + w[2] * pctiles[2][i]
                    + w[3] * pctiles[3][i]
            })
            .collect();

        let scaling_factor: Vec<f64> = moments
            .returns_value
            .iter()
            .zip(&moments.volatility_value)
            .map(|(r, v)| self.scaling.factor(*r, *v))
            .collect();

        let indicator = avg_percentile
            .iter()
            .zip(&scaling_factor)
            .map(|(avg, s)| avg / 100.0 * s)
            .collect();

        let [returns_pctile, volatility_pctile, momentum_pctile, fragility_pctile] = pctiles;
        HorizonColumns {
            moments,
            returns_pctile,
            volatility_pctile,
            momentum_pctile,
            fragility_pctile,
            avg_percentile,
            scaling_factor,
            indicator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::{assert_approx, DEFAULT_EPSILON};

    fn moments(returns_value: Vec<f64>, volatility_value: Vec<f64>) -> HorizonMoments {
        let n = returns_value.len();
        HorizonMoments {
            returns_value,
            volatility_value: volatility_value.clone(),
            momentum_value: vec![0.0; n],
            fragility_value: vec![0.0; n],
            moving_avg_price: vec![0.0; n],
            realized_vol: volatility_value,
            realized_mad: vec![0.0; n],
        }
    }

    #[test]
    fn logistic_is_half_at_zero() {
        assert_eq!(logistic(0.0, 3.0), 0.5);
        assert!(logistic(1.0, 3.0) > 0.5);
        assert!(logistic(-1.0, 3.0) < 0.5);
    }

    #[test]
    fn logistic_stays_inside_unit_interval_when_saturated() {
        assert!(logistic(1e6, 3.0) < 1.0);
        assert!(logistic(-1e6, 3.0) > 0.0);
        assert!(logistic(f64::INFINITY, 3.0) < 1.0);
        assert!(logistic(f64::NAN, 3.0).is_nan());

        // Near-constant growth: tiny volatility, large normalized return.
        let s = ScalingMode::Dynamic { steepness: 3.0 }.factor(0.05, 1e-9);
        assert!(s > 0.5 && s < 1.0);
    }

    #[test]
    fn zero_volatility_guards_division() {
        assert_eq!(normalized_return(0.2, 0.0), 0.0);
        assert_eq!(normalized_return(0.2, -1.0), 0.0);
        assert!(normalized_return(f64::NAN, 0.2).is_nan());
        assert!(normalized_return(0.2, f64::NAN).is_nan());
        assert_approx(normalized_return(0.2, 0.4), 0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn static_scaling_is_constant() {
        assert_eq!(ScalingMode::Static.factor(f64::NAN, 1.0), 0.5);
        assert_eq!(ScalingMode::Static.factor(10.0, 0.1), 0.5);
    }

    #[test]
    fn indicator_is_scaled_weighted_average() {
        let agg = HorizonAggregator::new(
            MomentWeights::new(0.4, 0.3, 0.2, 0.1).unwrap(),
            ScalingMode::Static,
        );
        let cols = agg.aggregate(
            moments(vec![0.1, 0.1], vec![0.2, 0.2]),
            [
                vec![100.0, 50.0],
                vec![50.0, 50.0],
                vec![0.0, f64::NAN],
                vec![100.0, 50.0],
            ],
        );
        // 40 + 15 + 0 + 10 = 65
        assert_approx(cols.avg_percentile[0], 65.0, DEFAULT_EPSILON);
        assert_approx(cols.indicator[0], 0.325, DEFAULT_EPSILON);
        assert!(cols.avg_percentile[1].is_nan());
        assert!(cols.indicator[1].is_nan());
        assert_eq!(cols.pctile(Moment::Returns), &[100.0, 50.0]);
    }

    #[test]
    fn dynamic_scaling_follows_return_sign() {
        let agg = HorizonAggregator::new(
            MomentWeights::default(),
            ScalingMode::Dynamic { steepness: 3.0 },
        );
        let cols = agg.aggregate(
            moments(vec![0.1, -0.1, 0.1], vec![0.2, 0.2, 0.0]),
            [vec![100.0; 3], vec![100.0; 3], vec![100.0; 3], vec![100.0; 3]],
        );
        assert_approx(cols.scaling_factor[0], logistic(0.5, 3.0), DEFAULT_EPSILON);
        assert!(cols.scaling_factor[1] < 0.5);
        assert_eq!(cols.scaling_factor[2], 0.5);
        assert_approx(cols.indicator[0], cols.scaling_factor[0], DEFAULT_EPSILON);
    }
}
