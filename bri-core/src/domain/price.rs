//! PriceSeries: the date-ordered price input to every computation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::DataError;

/// A single observation of an asset's price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Date-ordered price series for one asset.
///
/// Dates are strictly increasing and duplicate-free; this is checked once at
/// construction. Prices are NOT checked: a zero or negative price is carried
/// through and shows up downstream as NaN/inf, never as an error. A NaN price
/// is a missing observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from parallel date/price vectors.
    pub fn new(dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self, DataError> {
        if dates.len() != prices.len() {
            return Err(DataError::LengthMismatch {
                dates: dates.len(),
                prices: prices.len(),
            });
        }
        if let Some(i) = dates.windows(2).position(|w| w[0] >= w[1]) {
            return Err(DataError::UnorderedDates {
                previous: dates[i],
                next: dates[i + 1],
            });
        }
        Ok(Self { dates, prices })
    }

    /// Build a series from (date, price) points already in date order.
    pub fn from_points(points: &[PricePoint]) -> Result<Self, DataError> {
        let dates = points.iter().map(|p| p.date).collect();
        let prices = points.iter().map(|p| p.price).collect();
        Self::new(dates, prices)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn point(&self, index: usize) -> Option<PricePoint> {
        Some(PricePoint::new(*self.dates.get(index)?, *self.prices.get(index)?))
    }

    /// Number of observations dated on or before `date`.
    pub fn count_through(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d <= date)
    }

    /// The trailing `n` observations (the whole series when `n >= len`).
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.len().saturating_sub(n);
        PriceSeries {
            dates: self.dates[start..].to_vec(),
            prices: self.prices[start..].to_vec(),
        }
    }

    /// Observations dated on or after `date`.
    pub fn since(&self, date: NaiveDate) -> PriceSeries {
        let start = self.dates.partition_point(|d| *d < date);
        PriceSeries {
            dates: self.dates[start..].to_vec(),
            prices: self.prices[start..].to_vec(),
        }
    }
}

// Serialized as a list of points so the date/price pairing survives a round trip.
impl Serialize for PriceSeries {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (date, price) in self.dates.iter().zip(&self.prices) {
            seq.serialize_element(&PricePoint::new(*date, *price))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PriceSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<PricePoint>::deserialize(deserializer)?;
        PriceSeries::from_points(&points).map_err(serde::de::Error::custom)
    }
}
