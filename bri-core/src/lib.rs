//! BRI Core: the Bubble Risk Indicator statistical pipeline.
//!
//! Turns one asset's date-ordered price series into a per-date bubble risk
//! score:
//! - Returns processing (log or simple, optional global outlier filter)
//! - Four rolling moments per horizon (returns, volatility, momentum, fragility)
//! - Rolling percentile rank of each moment against its own history
//! - Weighted, logistically scaled horizon indicators
//! - Composite score across short, mid and long horizons
//!
//! Every stage is a pure function of its inputs. Missing values are `f64::NAN`
//! throughout and propagate rather than fail.

pub mod composite;
pub mod config;
pub mod data;
pub mod domain;
pub mod horizon;
pub mod moments;
pub mod percentile;
pub mod pipeline;
pub mod returns;
pub mod stats;
pub mod strategy;
pub mod table;

pub use composite::{current_status, HorizonStatus, StatusSnapshot};
pub use config::{BriConfig, BriConfigSpec, ConfigError, ConfigProvider};
pub use data::{DataError, PriceDataProvider};
pub use domain::{Horizon, Moment, PricePoint, PriceSeries};
pub use pipeline::{
    calculate_full_bri, calculate_full_bri_from_frame, calculate_incremental, calculate_with,
};
pub use strategy::{LegacyZScoreStrategy, PercentileRankStrategy, ScoringStrategy};
pub use table::{BriRecord, BriResultTable, MomentRecord};
