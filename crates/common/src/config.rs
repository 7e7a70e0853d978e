//! Syncer configuration: typed, small, loadable from TOML or environment.
//! Defaults are deterministic and never read from the environment.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Error loading or parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Operational parameters of the registry sync loop.
///
/// The tick interval is a liveness parameter, not a correctness parameter:
/// any cadence on the order of seconds converges to the same state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncerConfig {
    /// Delay between registry fetches, in milliseconds.
    pub tick_interval_ms: u64,

    /// Upper bound on one reconciler's dispatch per tick, in milliseconds.
    /// A reconciler exceeding it is reported and the loop moves on, so a
    /// hung capability cannot stall every other reconciler forever.
    pub sync_timeout_ms: u64,
}

impl Default for SyncerConfig {
    /// - `tick_interval_ms`: 12000 (12 seconds, registry cadence)
    /// - `sync_timeout_ms`: 30000 (30 seconds)
    fn default() -> Self {
        Self {
            tick_interval_ms: 12_000,
            sync_timeout_ms: 30_000,
        }
    }
}

impl SyncerConfig {
    /// Builds a config from environment variables, falling back to defaults
    /// for anything unset.
    ///
    /// - `SYNCER_TICK_INTERVAL_MS`
    /// - `SYNCER_SYNC_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("SYNCER_TICK_INTERVAL_MS") {
            config.tick_interval_ms = parse_ms("SYNCER_TICK_INTERVAL_MS", &raw)?;
        }
        if let Ok(raw) = std::env::var("SYNCER_SYNC_TIMEOUT_MS") {
            config.sync_timeout_ms = parse_ms("SYNCER_SYNC_TIMEOUT_MS", &raw)?;
        }
        Ok(config)
    }

    /// Loads a config from a TOML file. Missing keys take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&raw)?)
    }
}

fn parse_ms(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
        name,
        reason: e.to_string(),
    })
}
