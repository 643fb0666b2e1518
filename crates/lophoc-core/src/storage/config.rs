//! TOML-based application configuration.
//!
//! Stores reconciler settings:
//! - Pass interval for the watch scheduler
//! - Default access durations granted on approval
//!
//! Configuration is stored at `~/.config/lophoc/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Reconciler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Seconds between reconcile passes in watch mode.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Trial access window granted on approval, in days.
    #[serde(default = "default_trial_days")]
    pub trial_days: i64,
    /// Paid enrollment term granted on approval, in days.
    #[serde(default = "default_term_days")]
    pub term_days: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/lophoc/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

fn default_interval_secs() -> u64 {
    60
}
fn default_trial_days() -> i64 {
    7
}
fn default_term_days() -> i64 {
    30
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            trial_days: default_trial_days(),
            term_days: default_term_days(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/lophoc"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load the configuration, writing the defaults on first run.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist the configuration.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }
}
