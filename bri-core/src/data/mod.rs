//! Data boundary: provider trait, data errors, polars frame conversion

pub mod frame;
pub mod provider;

pub use frame::{frame_from_columns, price_series_from_frame};
pub use provider::{DataError, DataSource, InMemoryProvider, PriceDataProvider};
