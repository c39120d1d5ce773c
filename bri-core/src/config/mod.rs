//! BRI configuration: an immutable, validated value object.
//!
//! Every invariant is checked exactly once, when a value is constructed
//! (directly, through `BriConfigSpec::build`, or by deserializing TOML/JSON).
//! No computation re-validates a config; holding a `BriConfig` is proof that
//! it is well-formed.
//!
//! There is no process-wide default instance. `BriConfig::default()` builds a
//! fresh value, and named presets come from a `ConfigProvider`.

pub mod presets;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::Horizon;
use crate::horizon::ScalingMode;
use crate::returns::ReturnMethod;

pub use presets::{BuiltinPresets, ConfigProvider, PRESET_NAMES};

/// Tolerance for the weights-sum-to-one invariant.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Configuration contract violations. Raised at construction, never at call time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("moment weights must sum to 1.0 (±{WEIGHT_SUM_TOLERANCE}), got {sum}")]
    InvalidWeights { sum: f64 },

    #[error("moment weight '{name}' must be a non-negative number, got {value}")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("{field} must be a positive integer")]
    NonPositiveWindow { field: &'static str },

    #[error("min_periods_ratio must be in (0, 1], got {0}")]
    InvalidMinPeriodsRatio(f64),

    #[error("outlier_threshold must be >= 0, got {0}")]
    InvalidOutlierThreshold(f64),

    #[error("scaling_steepness must be > 0, got {0}")]
    NonPositiveSteepness(f64),

    #[error("bubble thresholds must satisfy warning < bubble < extreme, got {warning} / {bubble} / {extreme}")]
    InvalidThresholds {
        warning: f64,
        bubble: f64,
        extreme: f64,
    },

    #[error("unknown preset '{name}' (available: {})", available.join(", "))]
    UnknownPreset { name: String, available: Vec<String> },

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config I/O error: {0}")]
    Io(String),
}

// ─── Horizon windows ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawHorizonConfig {
    moment_window: usize,
    percentile_lookback: usize,
}

/// Moment window and percentile lookback for one horizon, both in rows.
///
/// `moment_window <= percentile_lookback` is expected but not enforced; see
/// `BriConfig::degenerate_horizons`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHorizonConfig")]
pub struct HorizonConfig {
    moment_window: usize,
    percentile_lookback: usize,
}

impl HorizonConfig {
    pub fn new(moment_window: usize, percentile_lookback: usize) -> Result<Self, ConfigError> {
        if moment_window == 0 {
            return Err(ConfigError::NonPositiveWindow {
                field: "moment_window",
            });
        }
        if percentile_lookback == 0 {
            return Err(ConfigError::NonPositiveWindow {
                field: "percentile_lookback",
            });
        }
        Ok(Self {
            moment_window,
            percentile_lookback,
        })
    }

    pub fn moment_window(&self) -> usize {
        self.moment_window
    }

    pub fn percentile_lookback(&self) -> usize {
        self.percentile_lookback
    }

    /// True when the moment window is longer than the ranking lookback, which
    /// yields a near-constant percentile series.
    pub fn is_degenerate(&self) -> bool {
        self.moment_window > self.percentile_lookback
    }
}

impl TryFrom<RawHorizonConfig> for HorizonConfig {
    type Error = ConfigError;

    fn try_from(raw: RawHorizonConfig) -> Result<Self, Self::Error> {
        HorizonConfig::new(raw.moment_window, raw.percentile_lookback)
    }
}

/// The three horizons of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub short_term: HorizonConfig,
    pub mid_term: HorizonConfig,
    pub long_term: HorizonConfig,
}

impl WindowConfig {
    pub fn new(short_term: HorizonConfig, mid_term: HorizonConfig, long_term: HorizonConfig) -> Self {
        Self {
            short_term,
            mid_term,
            long_term,
        }
    }

    pub fn get(&self, horizon: Horizon) -> HorizonConfig {
        match horizon {
            Horizon::Short => self.short_term,
            Horizon::Mid => self.mid_term,
            Horizon::Long => self.long_term,
        }
    }
}

impl Default for WindowConfig {
    /// 3m vs 1y, 6m vs 3y, 1y vs 5y (trading days).
    fn default() -> Self {
        Self {
            short_term: HorizonConfig {
                moment_window: 63,
                percentile_lookback: 252,
            },
            mid_term: HorizonConfig {
                moment_window: 126,
                percentile_lookback: 756,
            },
            long_term: HorizonConfig {
                moment_window: 252,
                percentile_lookback: 1260,
            },
        }
    }
}

// ─── Moment weights ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawMomentWeights {
    returns: f64,
    volatility: f64,
    momentum: f64,
    fragility: f64,
}

/// Weights of the four moments. Non-negative and summing to 1.0 ± 0.001.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMomentWeights")]
pub struct MomentWeights {
    returns: f64,
    volatility: f64,
    momentum: f64,
    fragility: f64,
}

impl MomentWeights {
    pub fn new(
        returns: f64,
        volatility: f64,
        momentum: f64,
        fragility: f64,
    ) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("returns", returns),
            ("volatility", volatility),
            ("momentum", momentum),
            ("fragility", fragility),
        ] {
            // `!(value >= 0.0)` also rejects NaN.
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }

        let sum = returns + volatility + momentum + fragility;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeights { sum });
        }

        Ok(Self {
            returns,
            volatility,
            momentum,
            fragility,
        })
    }

    pub fn returns(&self) -> f64 {
        self.returns
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn fragility(&self) -> f64 {
        self.fragility
    }

    /// Weights in (returns, volatility, momentum, fragility) order.
    pub fn as_array(&self) -> [f64; 4] {
        [self.returns, self.volatility, self.momentum, self.fragility]
    }
}

impl Default for MomentWeights {
    fn default() -> Self {
        Self {
            returns: 0.25,
            volatility: 0.25,
            momentum: 0.25,
            fragility: 0.25,
        }
    }
}

impl TryFrom<RawMomentWeights> for MomentWeights {
    type Error = ConfigError;

    fn try_from(raw: RawMomentWeights) -> Result<Self, Self::Error> {
        MomentWeights::new(raw.returns, raw.volatility, raw.momentum, raw.fragility)
    }
}

// ─── Bubble thresholds ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawBubbleThresholds {
    warning: f64,
    bubble: f64,
    extreme: f64,
}

/// Risk classification cut-offs for the legacy z-score strategy.
///
/// Documented upstream as "standard deviations", but compared against a
/// weighted sum of z-scores, which is not itself in standard-deviation units.
/// Kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBubbleThresholds")]
pub struct BubbleThresholds {
    warning: f64,
    bubble: f64,
    extreme: f64,
}

impl BubbleThresholds {
    pub fn new(warning: f64, bubble: f64, extreme: f64) -> Result<Self, ConfigError> {
        if !(warning < bubble && bubble < extreme) {
            return Err(ConfigError::InvalidThresholds {
                warning,
                bubble,
                extreme,
            });
        }
        Ok(Self {
            warning,
            bubble,
            extreme,
        })
    }

    pub fn warning(&self) -> f64 {
        self.warning
    }

    pub fn bubble(&self) -> f64 {
        self.bubble
    }

    pub fn extreme(&self) -> f64 {
        self.extreme
    }
}

impl Default for BubbleThresholds {
    fn default() -> Self {
        Self {
            warning: 1.5,
            bubble: 2.0,
            extreme: 2.5,
        }
    }
}

impl TryFrom<RawBubbleThresholds> for BubbleThresholds {
    type Error = ConfigError;

    fn try_from(raw: RawBubbleThresholds) -> Result<Self, Self::Error> {
        BubbleThresholds::new(raw.warning, raw.bubble, raw.extreme)
    }
}

// ─── BriConfig ───────────────────────────────────────────────────────

/// Unvalidated configuration fields. Build a `BriConfig` with `build()`.
///
/// Missing fields in TOML/JSON fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BriConfigSpec {
    pub windows: WindowConfig,
    pub weights: MomentWeights,
    pub thresholds: BubbleThresholds,
    pub use_log_returns: bool,
    pub min_periods_ratio: f64,
    pub remove_outliers: bool,
    pub outlier_threshold: f64,
    pub use_dynamic_scaling: bool,
    pub scaling_steepness: f64,
}

impl Default for BriConfigSpec {
    fn default() -> Self {
        Self {
            windows: WindowConfig::default(),
            weights: MomentWeights::default(),
            thresholds: BubbleThresholds::default(),
            use_log_returns: true,
            min_periods_ratio: 0.8,
            remove_outliers: false,
            outlier_threshold: 3.0,
            use_dynamic_scaling: true,
            scaling_steepness: 3.0,
        }
    }
}

impl BriConfigSpec {
    /// Validate the scalar knobs and produce an immutable `BriConfig`.
    pub fn build(self) -> Result<BriConfig, ConfigError> {
        BriConfig::try_from(self)
    }
}

/// Validated, immutable BRI configuration shared read-only by every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BriConfigSpec", into = "BriConfigSpec")]
pub struct BriConfig {
    spec: BriConfigSpec,
}

impl TryFrom<BriConfigSpec> for BriConfig {
    type Error = ConfigError;

    fn try_from(spec: BriConfigSpec) -> Result<Self, Self::Error> {
        // `!(x > 0.0)` also rejects NaN.
        if !(spec.min_periods_ratio > 0.0 && spec.min_periods_ratio <= 1.0) {
            return Err(ConfigError::InvalidMinPeriodsRatio(spec.min_periods_ratio));
        }
        if !(spec.outlier_threshold >= 0.0) {
            return Err(ConfigError::InvalidOutlierThreshold(spec.outlier_threshold));
        }
        if !(spec.scaling_steepness > 0.0) || !spec.scaling_steepness.is_finite() {
            return Err(ConfigError::NonPositiveSteepness(spec.scaling_steepness));
        }

        for horizon in Horizon::ALL {
            let hc = spec.windows.get(horizon);
            if hc.is_degenerate() {
                tracing::warn!(
                    %horizon,
                    moment_window = hc.moment_window(),
                    percentile_lookback = hc.percentile_lookback(),
                    "moment_window exceeds percentile_lookback; percentile ranks will be near-constant"
                );
            }
        }

        Ok(Self { spec })
    }
}

impl From<BriConfig> for BriConfigSpec {
    fn from(config: BriConfig) -> Self {
        config.spec
    }
}

impl Default for BriConfig {
    fn default() -> Self {
        Self {
            spec: BriConfigSpec::default(),
        }
    }
}

impl BriConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from TOML. Missing fields take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// A copy of the underlying fields, for deriving a modified configuration.
    pub fn to_spec(&self) -> BriConfigSpec {
        self.spec.clone()
    }

    /// BLAKE3 hash of the canonical JSON form. Identical configs share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_vec(self).expect("BriConfig must serialize");
        blake3::hash(&json).to_hex().to_string()
    }

    pub fn windows(&self) -> &WindowConfig {
        &self.spec.windows
    }

    pub fn horizon(&self, horizon: Horizon) -> HorizonConfig {
        self.spec.windows.get(horizon)
    }

    pub fn weights(&self) -> &MomentWeights {
        &self.spec.weights
    }

    pub fn thresholds(&self) -> &BubbleThresholds {
        &self.spec.thresholds
    }

    pub fn use_log_returns(&self) -> bool {
        self.spec.use_log_returns
    }

    pub fn return_method(&self) -> ReturnMethod {
        if self.spec.use_log_returns {
            ReturnMethod::Log
        } else {
            ReturnMethod::Simple
        }
    }

    pub fn min_periods_ratio(&self) -> f64 {
        self.spec.min_periods_ratio
    }

    /// `floor(window * min_periods_ratio)`, never below 1.
    pub fn min_periods(&self, window: usize) -> usize {
        ((window as f64 * self.spec.min_periods_ratio).floor() as usize).max(1)
    }

    pub fn remove_outliers(&self) -> bool {
        self.spec.remove_outliers
    }

    pub fn outlier_threshold(&self) -> f64 {
        self.spec.outlier_threshold
    }

    pub fn use_dynamic_scaling(&self) -> bool {
        self.spec.use_dynamic_scaling
    }

    pub fn scaling_steepness(&self) -> f64 {
        self.spec.scaling_steepness
    }

    pub fn scaling_mode(&self) -> ScalingMode {
        if self.spec.use_dynamic_scaling {
            ScalingMode::Dynamic {
                steepness: self.spec.scaling_steepness,
            }
        } else {
            ScalingMode::Static
        }
    }

    /// Largest percentile lookback across horizons.
    pub fn max_percentile_lookback(&self) -> usize {
        Horizon::ALL
            .iter()
            .map(|h| self.horizon(*h).percentile_lookback())
            .max()
            .unwrap_or(0)
    }

    /// Rows of history an incremental run needs ahead of the first row it
    /// must reproduce exactly: every moment inside the deepest percentile
    /// window must itself have a full moment window behind it.
    pub fn required_history(&self) -> usize {
        Horizon::ALL
            .iter()
            .map(|h| {
                let hc = self.horizon(*h);
                hc.percentile_lookback() + hc.moment_window()
            })
            .max()
            .unwrap_or(0)
    }

    pub fn has_degenerate_horizon(&self) -> bool {
        Horizon::ALL.iter().any(|h| self.horizon(*h).is_degenerate())
    }

    /// Horizons whose moment window exceeds their percentile lookback.
    pub fn degenerate_horizons(&self) -> Vec<Horizon> {
        Horizon::ALL
            .into_iter()
            .filter(|h| self.horizon(*h).is_degenerate())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_reference_parameters() {
        let config = BriConfig::default();
        assert_eq!(config.horizon(Horizon::Short), HorizonConfig::new(63, 252).unwrap());
        assert_eq!(config.horizon(Horizon::Mid), HorizonConfig::new(126, 756).unwrap());
        assert_eq!(config.horizon(Horizon::Long), HorizonConfig::new(252, 1260).unwrap());
        assert_eq!(config.weights().as_array(), [0.25; 4]);
        assert!(config.use_log_returns());
        assert_eq!(config.min_periods_ratio(), 0.8);
        assert!(!config.remove_outliers());
        assert!(config.use_dynamic_scaling());
        assert_eq!(config.scaling_steepness(), 3.0);
        assert_eq!(config.max_percentile_lookback(), 1260);
        assert_eq!(config.required_history(), 1512);
    }

    #[test]
    fn weights_must_sum_to_one() {
        assert!(MomentWeights::new(0.25, 0.25, 0.25, 0.25).is_ok());
        assert!(MomentWeights::new(0.2505, 0.25, 0.25, 0.25).is_ok());
        let err = MomentWeights::new(0.3, 0.3, 0.3, 0.3).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights { .. }));
    }

    #[test]
    fn weights_reject_negative_and_nan() {
        assert!(matches!(
            MomentWeights::new(-0.1, 0.4, 0.4, 0.3),
            Err(ConfigError::NegativeWeight { name: "returns", .. })
        ));
        assert!(MomentWeights::new(f64::NAN, 0.5, 0.25, 0.25).is_err());
    }

    #[test]
    fn windows_must_be_positive() {
        assert!(matches!(
            HorizonConfig::new(0, 10),
            Err(ConfigError::NonPositiveWindow {
                field: "moment_window"
            })
        ));
        assert!(matches!(
            HorizonConfig::new(10, 0),
            Err(ConfigError::NonPositiveWindow {
                field: "percentile_lookback"
            })
        ));
    }

    #[test]
    fn scalar_knobs_are_validated() {
        let bad_ratio = BriConfigSpec {
            min_periods_ratio: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_ratio.build(),
            Err(ConfigError::InvalidMinPeriodsRatio(_))
        ));

        let bad_k = BriConfigSpec {
            scaling_steepness: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_k.build(),
            Err(ConfigError::NonPositiveSteepness(_))
        ));

        let bad_outlier = BriConfigSpec {
            outlier_threshold: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_outlier.build(),
            Err(ConfigError::InvalidOutlierThreshold(_))
        ));
    }

    #[test]
    fn thresholds_must_be_ordered() {
        assert!(BubbleThresholds::new(1.0, 1.5, 2.0).is_ok());
        assert!(BubbleThresholds::new(2.0, 1.5, 2.5).is_err());
    }

    #[test]
    fn min_periods_floors_and_never_drops_below_one() {
        let config = BriConfig::default();
        assert_eq!(config.min_periods(63), 50);
        assert_eq!(config.min_periods(1), 1);
    }

    #[test]
    fn degenerate_horizon_is_reported_not_rejected() {
        let spec = BriConfigSpec {
            windows: WindowConfig::new(
                HorizonConfig::new(100, 50).unwrap(),
                HorizonConfig::new(126, 756).unwrap(),
                HorizonConfig::new(252, 1260).unwrap(),
            ),
            ..Default::default()
        };
        let config = spec.build().unwrap();
        assert!(config.has_degenerate_horizon());
        assert_eq!(config.degenerate_horizons(), vec![Horizon::Short]);
        assert!(!BriConfig::default().has_degenerate_horizon());
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let config = BriConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = BriConfig::from_toml(&text).unwrap();
        assert_eq!(config, parsed);
        assert_eq!(config.fingerprint(), parsed.fingerprint());
    }

    #[test]
    fn toml_partial_uses_defaults_and_validates() {
        let config = BriConfig::from_toml("min_periods_ratio = 0.3\nscaling_steepness = 2.0\n").unwrap();
        assert_eq!(config.min_periods_ratio(), 0.3);
        assert_eq!(config.windows(), &WindowConfig::default());

        let bad = "[weights]\nreturns = 0.5\nvolatility = 0.5\nmomentum = 0.5\nfragility = 0.5\n";
        let err = BriConfig::from_toml(bad).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn fingerprint_changes_with_parameters() {
        let a = BriConfig::default();
        let b = BriConfigSpec {
            scaling_steepness: 5.0,
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
