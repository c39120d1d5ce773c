//! BriResultTable: the per-date output of a BRI computation.

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::data::{frame_from_columns, DataError};
use crate::domain::{Horizon, Moment};
use crate::horizon::HorizonColumns;
use crate::moments::HorizonMoments;

fn present(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

/// Final per-date record: price, return, horizon indicators, composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriRecord {
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub returns: Option<f64>,
    pub short_indicator: Option<f64>,
    pub mid_indicator: Option<f64>,
    pub long_indicator: Option<f64>,
    pub composite_bri: Option<f64>,
}

/// Per-horizon, per-date detail: raw moments, intermediates, ranks, indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentRecord {
    pub horizon: Horizon,
    pub date: NaiveDate,
    pub returns_value: Option<f64>,
    pub volatility_value: Option<f64>,
    pub momentum_value: Option<f64>,
    pub fragility_value: Option<f64>,
    pub moving_avg_price: Option<f64>,
    pub realized_vol: Option<f64>,
    pub realized_mad: Option<f64>,
    pub returns_pctile: Option<f64>,
    pub volatility_pctile: Option<f64>,
    pub momentum_pctile: Option<f64>,
    pub fragility_pctile: Option<f64>,
    pub avg_percentile: Option<f64>,
    pub scaling_factor: Option<f64>,
    pub indicator: Option<f64>,
}

/// Result of a BRI run: one row per input date, NaN where not yet computable.
///
/// Deserialization checks that every column has one value per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResultTable")]
pub struct BriResultTable {
    dates: Vec<NaiveDate>,
    price: Vec<f64>,
    returns: Vec<f64>,
    horizons: [HorizonColumns; 3],
    composite_bri: Vec<f64>,
    config_fingerprint: String,
}

#[derive(Deserialize)]
struct RawResultTable {
    dates: Vec<NaiveDate>,
    price: Vec<f64>,
    returns: Vec<f64>,
    horizons: [HorizonColumns; 3],
    composite_bri: Vec<f64>,
    config_fingerprint: String,
}

impl TryFrom<RawResultTable> for BriResultTable {
    type Error = DataError;

    fn try_from(raw: RawResultTable) -> Result<Self, Self::Error> {
        let table = BriResultTable {
            dates: raw.dates,
            price: raw.price,
            returns: raw.returns,
            horizons: raw.horizons,
            composite_bri: raw.composite_bri,
            config_fingerprint: raw.config_fingerprint,
        };
        let expected = table.len();
        if let Some((column, values)) = table
            .columns()
            .into_iter()
            .find(|(_, values)| values.len() != expected)
        {
            return Err(DataError::RaggedColumn {
                column,
                len: values.len(),
                expected,
            });
        }
        Ok(table)
    }
}

impl BriResultTable {
    pub(crate) fn new(
        dates: Vec<NaiveDate>,
        price: Vec<f64>,
        returns: Vec<f64>,
        horizons: [HorizonColumns; 3],
        composite_bri: Vec<f64>,
        config_fingerprint: String,
    ) -> Self {
        debug_assert!(horizons.iter().all(|h| h.len() == dates.len()));
        Self {
            dates,
            price,
            returns,
            horizons,
            composite_bri,
            config_fingerprint,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn price(&self) -> &[f64] {
        &self.price
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn composite_bri(&self) -> &[f64] {
        &self.composite_bri
    }

    pub fn horizon(&self, horizon: Horizon) -> &HorizonColumns {
        &self.horizons[horizon.index()]
    }

    /// Fingerprint of the configuration that produced this table.
    pub fn config_fingerprint(&self) -> &str {
        &self.config_fingerprint
    }

    /// Rows with a non-missing composite.
    pub fn valid_rows(&self) -> usize {
        self.composite_bri.iter().filter(|v| !v.is_nan()).count()
    }

    /// Every numeric column in surface order, paired with its name.
    pub fn columns(&self) -> Vec<(String, &[f64])> {
        let mut cols: Vec<(String, &[f64])> = vec![
            ("price".into(), self.price.as_slice()),
            ("returns".into(), self.returns.as_slice()),
            ("composite_bri".into(), self.composite_bri.as_slice()),
        ];
        for h in Horizon::ALL {
            cols.push((format!("{h}_indicator"), self.horizon(h).indicator.as_slice()));
        }
        for h in Horizon::ALL {
            cols.push((format!("{h}_avg_percentile"), self.horizon(h).avg_percentile.as_slice()));
        }
        for h in Horizon::ALL {
            let hc = self.horizon(h);
            for m in Moment::ALL {
                cols.push((m.value_column(h), hc.moments.value(m)));
            }
            for m in Moment::ALL {
                cols.push((m.pctile_column(h), hc.pctile(m)));
            }
            cols.push((format!("{h}_moving_avg_price"), hc.moments.moving_avg_price.as_slice()));
            cols.push((format!("{h}_realized_vol"), hc.moments.realized_vol.as_slice()));
            cols.push((format!("{h}_realized_mad"), hc.moments.realized_mad.as_slice()));
            cols.push((format!("{h}_scaling_factor"), hc.scaling_factor.as_slice()));
        }
        cols
    }

    /// Names of the numeric columns (the `date` column is not included).
    pub fn column_names(&self) -> Vec<String> {
        self.columns().into_iter().map(|(name, _)| name).collect()
    }

    /// Look up a numeric column by its surface name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values)
    }

    pub fn record(&self, index: usize) -> Option<BriRecord> {
        let date = *self.dates.get(index)?;
        Some(BriRecord {
            date,
            price: present(self.price[index]),
            returns: present(self.returns[index]),
            short_indicator: present(self.horizons[0].indicator[index]),
            mid_indicator: present(self.horizons[1].indicator[index]),
            long_indicator: present(self.horizons[2].indicator[index]),
            composite_bri: present(self.composite_bri[index]),
        })
    }

    pub fn records(&self) -> Vec<BriRecord> {
        (0..self.len()).filter_map(|i| self.record(i)).collect()
    }

    pub fn moment_record(&self, horizon: Horizon, index: usize) -> Option<MomentRecord> {
        let date = *self.dates.get(index)?;
        let hc = self.horizon(horizon);
        let m = &hc.moments;
        Some(MomentRecord {
            horizon,
            date,
            returns_value: present(m.returns_value[index]),
            volatility_value: present(m.volatility_value[index]),
            momentum_value: present(m.momentum_value[index]),
            fragility_value: present(m.fragility_value[index]),
            moving_avg_price: present(m.moving_avg_price[index]),
            realized_vol: present(m.realized_vol[index]),
            realized_mad: present(m.realized_mad[index]),
            returns_pctile: present(hc.returns_pctile[index]),
            volatility_pctile: present(hc.volatility_pctile[index]),
            momentum_pctile: present(hc.momentum_pctile[index]),
            fragility_pctile: present(hc.fragility_pctile[index]),
            avg_percentile: present(hc.avg_percentile[index]),
            scaling_factor: present(hc.scaling_factor[index]),
            indicator: present(hc.indicator[index]),
        })
    }

    /// Rows dated strictly after `date`.
    pub fn rows_after(&self, date: NaiveDate) -> BriResultTable {
        let start = self.dates.partition_point(|d| *d <= date);
        self.slice_from(start)
    }

    /// The trailing `n` rows.
    pub fn tail(&self, n: usize) -> BriResultTable {
        self.slice_from(self.len().saturating_sub(n))
    }

    fn slice_from(&self, start: usize) -> BriResultTable {
        let cut = |v: &Vec<f64>| v[start..].to_vec();
        let horizons = self.horizons.clone().map(|hc| HorizonColumns {
            moments: HorizonMoments {
                returns_value: cut(&hc.moments.returns_value),
                volatility_value: cut(&hc.moments.volatility_value),
                momentum_value: cut(&hc.moments.momentum_value),
                fragility_value: cut(&hc.moments.fragility_value),
                moving_avg_price: cut(&hc.moments.moving_avg_price),
                realized_vol: cut(&hc.moments.realized_vol),
                realized_mad: cut(&hc.moments.realized_mad),
            },
            returns_pctile: cut(&hc.returns_pctile),
            volatility_pctile: cut(&hc.volatility_pctile),
            momentum_pctile: cut(&hc.momentum_pctile),
            fragility_pctile: cut(&hc.fragility_pctile),
            avg_percentile: cut(&hc.avg_percentile),
            scaling_factor: cut(&hc.scaling_factor),
            indicator: cut(&hc.indicator),
        });
        BriResultTable {
            dates: self.dates[start..].to_vec(),
            price: cut(&self.price),
            returns: cut(&self.returns),
            horizons,
            composite_bri: cut(&self.composite_bri),
            config_fingerprint: self.config_fingerprint.clone(),
        }
    }

    /// Exact equality including NaN payloads; `PartialEq` treats NaN != NaN.
    pub fn bitwise_eq(&self, other: &BriResultTable) -> bool {
        if self.dates != other.dates {
            return false;
        }
        let (a, b) = (self.columns(), other.columns());
        a.len() == b.len()
            && a.iter().zip(&b).all(|((na, va), (nb, vb))| {
                na == nb
                    && va.len() == vb.len()
                    && va.iter().zip(vb.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
            })
    }

    /// Polars frame with a `date` column followed by every numeric column; NaN becomes null.
    pub fn to_dataframe(&self) -> Result<DataFrame, DataError> {
        frame_from_columns(&self.dates, &self.columns())
    }
}
