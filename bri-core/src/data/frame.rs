//! Polars DataFrame boundary: price tables in, result tables out.
//!
//! Collaborators hand over tabular data with a named price column; this
//! module is the only place the core touches polars.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use super::provider::DataError;
use crate::domain::PriceSeries;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

fn frame_err(context: &str) -> impl Fn(PolarsError) -> DataError + '_ {
    move |e| DataError::Frame(format!("{context}: {e}"))
}

pub(crate) fn date_to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_CE_DAYS
}

pub(crate) fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_CE_DAYS)?)
}

/// Extract a `PriceSeries` from a DataFrame.
///
/// `date_column` may be a Date column or an ISO-8601 string column. The
/// `price_column` may be any numeric type; nulls become NaN (missing).
/// Fails with `DataError::MissingColumn` if the price column is absent.
pub fn price_series_from_frame(
    df: &DataFrame,
    date_column: &str,
    price_column: &str,
) -> Result<PriceSeries, DataError> {
    let prices = df
        .column(price_column)
        .map_err(|_| DataError::MissingColumn {
            column: price_column.to_string(),
        })?;
    let dates = df
        .column(date_column)
        .map_err(|_| DataError::MissingColumn {
            column: date_column.to_string(),
        })?;

    if df.height() == 0 {
        return Err(DataError::EmptySeries);
    }

    let dates = dates.cast(&DataType::Date).map_err(frame_err("date cast"))?;
    let prices = prices
        .cast(&DataType::Float64)
        .map_err(frame_err("price cast"))?;

    let date_ca = dates.date().map_err(frame_err("date column type"))?;
    let price_ca = prices.f64().map_err(frame_err("price column type"))?;

    let n = df.height();
    let mut out_dates = Vec::with_capacity(n);
    let mut out_prices = Vec::with_capacity(n);

    for i in 0..n {
        let days = date_ca.get(i).ok_or(DataError::NullDate { row: i })?;
        let date = epoch_days_to_date(days)
            .ok_or_else(|| DataError::Frame(format!("date out of range at row {i}")))?;
        out_dates.push(date);
        out_prices.push(price_ca.get(i).unwrap_or(f64::NAN));
    }

    PriceSeries::new(out_dates, out_prices)
}

/// Build a DataFrame with a leading `date` column followed by float columns.
///
/// NaN values are written as nulls so that downstream consumers see a
/// proper missing marker rather than a float artifact.
pub fn frame_from_columns(
    dates: &[NaiveDate],
    columns: &[(String, &[f64])],
) -> Result<DataFrame, DataError> {
    let days: Vec<i32> = dates.iter().map(|d| date_to_epoch_days(*d)).collect();

    let mut out = Vec::with_capacity(columns.len() + 1);
    out.push(
        Column::new("date".into(), days)
            .cast(&DataType::Date)
            .map_err(frame_err("date cast"))?,
    );

    for (name, values) in columns {
        if values.len() != dates.len() {
            return Err(DataError::LengthMismatch {
                dates: dates.len(),
                prices: values.len(),
            });
        }
        let nullable: Vec<Option<f64>> = values
            .iter()
            .map(|v| if v.is_nan() { None } else { Some(*v) })
            .collect();
        out.push(Column::new(name.as_str().into(), nullable));
    }

    DataFrame::new(out).map_err(frame_err("dataframe creation"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_frame() -> DataFrame {
        let days: Vec<i32> = [d(2), d(3), d(4)]
            .iter()
            .map(|d| date_to_epoch_days(*d))
            .collect();
        DataFrame::new(vec![
            Column::new("date".into(), days)
                .cast(&DataType::Date)
                .unwrap(),
            Column::new("Close".into(), vec![Some(100.0), None, Some(102.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn epoch_day_conversion_roundtrip() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_epoch_days(epoch), 0);
        assert_eq!(epoch_days_to_date(0), Some(epoch));
        assert_eq!(epoch_days_to_date(date_to_epoch_days(d(15))), Some(d(15)));
    }

    #[test]
    fn reads_named_price_column_with_nulls_as_nan() {
        let series = price_series_from_frame(&sample_frame(), "date", "Close").unwrap();
        assert_eq!(series.dates(), &[d(2), d(3), d(4)]);
        assert_eq!(series.prices()[0], 100.0);
        assert!(series.prices()[1].is_nan());
        assert_eq!(series.prices()[2], 102.0);
    }

    #[test]
    fn missing_price_column_is_data_error() {
        let err = price_series_from_frame(&sample_frame(), "date", "Adj Close").unwrap_err();
        match err {
            DataError::MissingColumn { column } => assert_eq!(column, "Adj Close"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn frame_from_columns_writes_nan_as_null() {
        let values = [1.0, f64::NAN];
        let df = frame_from_columns(&[d(2), d(3)], &[("x".to_string(), &values[..])]).unwrap();
        assert_eq!(df.height(), 2);
        let x = df.column("x").unwrap().f64().unwrap();
        assert_eq!(x.get(0), Some(1.0));
        assert_eq!(x.get(1), None);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
    }
}
