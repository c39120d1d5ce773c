//! Domain types for the BRI pipeline

pub mod horizon;
pub mod price;

pub use horizon::{Horizon, Moment};
pub use price::{PricePoint, PriceSeries};
