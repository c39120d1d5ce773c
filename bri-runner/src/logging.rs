//! Logging setup on top of `tracing-subscriber`.
//!
//! Two output formats: `pretty` for terminals and `json` (one object per
//! event) for log collection. `RUST_LOG` overrides the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::RunError;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `bri_core=debug`.
    pub level: String,
    pub format: LogFormat,
    /// Tag events with the emitting thread; batches run on the rayon pool.
    pub thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            thread_ids: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>, format: LogFormat) -> Self {
        Self {
            level: level.into(),
            format,
            ..Default::default()
        }
    }

    /// Format from `BRI_LOG_FORMAT`; the level is left to `RUST_LOG`.
    pub fn from_env() -> Self {
        let format = std::env::var("BRI_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        Self {
            format,
            ..Default::default()
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: LogConfig) -> Result<(), RunError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| RunError::Logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_thread_ids(config.thread_ids))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_thread_ids(config.thread_ids))
            .try_init(),
    };
    installed.map_err(|e| RunError::Logging(e.to_string()))?;

    tracing::debug!(format = ?config.format, level = %config.level, "logging initialized");
    Ok(())
}
