use super::ScoringStrategy;
use crate::config::BriConfig;
use crate::data::DataError;
use crate::domain::PriceSeries;
use crate::pipeline::calculate_full_bri;
use crate::table::BriResultTable;

/// Percentile-ranked moments, weighted and scaled per horizon.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentileRankStrategy;

impl ScoringStrategy for PercentileRankStrategy {
    type Output = BriResultTable;

    fn name(&self) -> &str {
        "percentile_rank"
    }

    fn score(&self, prices: &PriceSeries, config: &BriConfig) -> Result<BriResultTable, DataError> {
        calculate_full_bri(prices, config)
    }
}
