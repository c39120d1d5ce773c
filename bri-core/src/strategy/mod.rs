//! Scoring strategies.
//!
//! `PercentileRankStrategy` is the canonical BRI methodology and backs
//! `calculate_full_bri`. `LegacyZScoreStrategy` is the earlier methodology:
//! z-scored distribution moments compared against `BubbleThresholds`.

pub mod legacy;
pub mod percentile;

pub use legacy::{
    LegacyHorizonScore, LegacyScoreTable, LegacyZScoreStrategy, NormalizationMethod, RiskLevel,
};
pub use percentile::PercentileRankStrategy;

use crate::config::BriConfig;
use crate::data::DataError;
use crate::domain::PriceSeries;

/// A way of turning a price series into a per-date risk table.
pub trait ScoringStrategy: Send + Sync {
    type Output;

    fn name(&self) -> &str;

    fn score(&self, prices: &PriceSeries, config: &BriConfig) -> Result<Self::Output, DataError>;
}
