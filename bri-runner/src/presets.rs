//! Preset registry: built-in presets plus user presets loaded from TOML.
//!
//! A user preset file `<dir>/<name>.toml` holds a (possibly partial)
//! `BriConfig`; missing fields take the defaults. User presets shadow
//! built-ins of the same name.

use std::collections::BTreeMap;
use std::path::Path;

use bri_core::config::{BriConfig, BuiltinPresets, ConfigError, ConfigProvider};

#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    builtin: BuiltinPresets,
    custom: BTreeMap<String, BriConfig>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every `*.toml` file in `dir` loaded as a preset.
    pub fn with_dir(dir: &Path) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.load_dir(dir)?;
        Ok(registry)
    }

    /// Load every `*.toml` file in `dir`; returns how many were loaded.
    ///
    /// One invalid file fails the whole load.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ConfigError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| ConfigError::Io(format!("read {}: {e}", dir.display())))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ConfigError::Io(e.to_string()))?
                .path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let config = BriConfig::from_file(path).map_err(|e| match e {
                ConfigError::Parse(msg) => {
                    ConfigError::Parse(format!("{}: {msg}", path.display()))
                }
                other => other,
            })?;
            tracing::debug!(preset = name, path = %path.display(), "loaded preset");
            self.custom.insert(name.to_string(), config);
        }
        Ok(paths.len())
    }

    pub fn insert(&mut self, name: impl Into<String>, config: BriConfig) {
        self.custom.insert(name.into(), config);
    }

    /// Write `config` to `<dir>/<name>.toml`.
    pub fn save(dir: &Path, name: &str, config: &BriConfig) -> Result<(), ConfigError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| ConfigError::Io(format!("create {}: {e}", dir.display())))?;
        let path = dir.join(format!("{name}.toml"));
        std::fs::write(&path, config.to_toml()?)
            .map_err(|e| ConfigError::Io(format!("write {}: {e}", path.display())))
    }
}

impl ConfigProvider for PresetRegistry {
    fn get(&self, preset: &str) -> Result<BriConfig, ConfigError> {
        if let Some(config) = self.custom.get(preset) {
            return Ok(config.clone());
        }
        match self.builtin.get(preset) {
            Err(ConfigError::UnknownPreset { name, .. }) => Err(ConfigError::UnknownPreset {
                name,
                available: self.names(),
            }),
            other => other,
        }
    }

    fn names(&self) -> Vec<String> {
        let mut names = self.builtin.names();
        for name in self.custom.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}
