//! CompositeScorer: the mean of the three horizon indicators, and the
//! "current status" view of a result table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Horizon;
use crate::table::BriResultTable;

/// `(short + mid + long) / 3`; NaN whenever any horizon is NaN.
pub fn composite(short: &[f64], mid: &[f64], long: &[f64]) -> Vec<f64> {
    short
        .iter()
        .zip(mid)
        .zip(long)
        .map(|((s, m), l)| (s + m + l) / 3.0)
        .collect()
}

/// Indicator and averaged percentile of one horizon on the status date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonStatus {
    pub horizon: Horizon,
    pub indicator: f64,
    pub avg_percentile: f64,
}

/// The latest fully-scored row of a result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub composite_bri: f64,
    pub horizons: [HorizonStatus; 3],
}

impl StatusSnapshot {
    pub fn horizon(&self, horizon: Horizon) -> &HorizonStatus {
        &self.horizons[horizon.index()]
    }
}

/// Snapshot of the last row with a non-missing composite.
///
/// `None` means the history is too short to score any row; it is not an error.
pub fn current_status(table: &BriResultTable) -> Option<StatusSnapshot> {
    let i = table.composite_bri().iter().rposition(|v| !v.is_nan())?;
    let horizons = Horizon::ALL.map(|h| {
        let cols = table.horizon(h);
        HorizonStatus {
            horizon: h,
            indicator: cols.indicator[i],
            avg_percentile: cols.avg_percentile[i],
        }
    });
    Some(StatusSnapshot {
        date: table.dates()[i],
        price: table.price()[i],
        composite_bri: table.composite_bri()[i],
        horizons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_is_mean_of_horizons() {
        let c = composite(&[0.3, 0.3], &[0.6, f64::NAN], &[0.9, 0.9]);
        assert!((c[0] - 0.6).abs() < 1e-12);
        assert!(c[1].is_nan());
    }
}
