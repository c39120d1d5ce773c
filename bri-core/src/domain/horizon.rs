//! Horizon and moment identifiers, and the column names derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three analysis horizons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Short,
    Mid,
    Long,
}

impl Horizon {
    /// All horizons in canonical (short, mid, long) order.
    pub const ALL: [Horizon; 3] = [Horizon::Short, Horizon::Mid, Horizon::Long];

    /// Column prefix: `short`, `mid`, `long`.
    pub fn prefix(self) -> &'static str {
        match self {
            Horizon::Short => "short",
            Horizon::Mid => "mid",
            Horizon::Long => "long",
        }
    }

    /// Position of this horizon in `ALL`.
    pub fn index(self) -> usize {
        match self {
            Horizon::Short => 0,
            Horizon::Mid => 1,
            Horizon::Long => 2,
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One of the four moments scored per horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Moment {
    Returns,
    Volatility,
    Momentum,
    Fragility,
}

impl Moment {
    pub const ALL: [Moment; 4] = [
        Moment::Returns,
        Moment::Volatility,
        Moment::Momentum,
        Moment::Fragility,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Moment::Returns => "returns",
            Moment::Volatility => "volatility",
            Moment::Momentum => "momentum",
            Moment::Fragility => "fragility",
        }
    }

    /// `{horizon}_{moment}_value`
    pub fn value_column(self, horizon: Horizon) -> String {
        format!("{}_{}_value", horizon.prefix(), self.key())
    }

    /// `{horizon}_{moment}_pctile`
    pub fn pctile_column(self, horizon: Horizon) -> String {
        format!("{}_{}_pctile", horizon.prefix(), self.key())
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
