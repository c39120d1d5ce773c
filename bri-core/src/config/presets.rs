//! Named configuration presets.
//!
//! Presets are built on demand; nothing here is a shared mutable default.

use super::{
    BriConfig, BriConfigSpec, BubbleThresholds, ConfigError, HorizonConfig, MomentWeights,
    WindowConfig,
};

/// Names accepted by `BuiltinPresets`.
pub const PRESET_NAMES: [&str; 6] = [
    "default",
    "conservative",
    "momentum",
    "short_term",
    "long_term",
    "relaxed",
];

/// Resolves a preset name to a validated configuration.
pub trait ConfigProvider: Send + Sync {
    fn get(&self, preset: &str) -> Result<BriConfig, ConfigError>;

    /// All preset names this provider can resolve.
    fn names(&self) -> Vec<String>;
}

/// The presets that ship with the library.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPresets;

impl ConfigProvider for BuiltinPresets {
    fn get(&self, preset: &str) -> Result<BriConfig, ConfigError> {
        let spec = match preset {
            "default" => BriConfigSpec::default(),
            // Emphasize volatility and fragility, trigger earlier.
            "conservative" => BriConfigSpec {
                weights: MomentWeights::new(0.15, 0.35, 0.15, 0.35)?,
                thresholds: BubbleThresholds::new(1.0, 1.5, 2.0)?,
                ..Default::default()
            },
            "momentum" => BriConfigSpec {
                weights: MomentWeights::new(0.35, 0.15, 0.35, 0.15)?,
                ..Default::default()
            },
            "short_term" => BriConfigSpec {
                windows: WindowConfig::new(
                    HorizonConfig::new(21, 63)?,
                    HorizonConfig::new(63, 252)?,
                    HorizonConfig::new(126, 756)?,
                ),
                ..Default::default()
            },
            "long_term" => BriConfigSpec {
                windows: WindowConfig::new(
                    HorizonConfig::new(126, 756)?,
                    HorizonConfig::new(252, 1260)?,
                    HorizonConfig::new(756, 2520)?,
                ),
                ..Default::default()
            },
            // For assets with a short listing history.
            "relaxed" => BriConfigSpec {
                min_periods_ratio: 0.3,
                scaling_steepness: 2.0,
                ..Default::default()
            },
            other => {
                return Err(ConfigError::UnknownPreset {
                    name: other.to_string(),
                    available: self.names(),
                })
            }
        };
        spec.build()
    }

    fn names(&self) -> Vec<String> {
        PRESET_NAMES.iter().map(|s| s.to_string()).collect()
    }
}
