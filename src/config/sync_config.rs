//! Synchronization settings stored in `~/.netmap-sync/config.toml`.
//!
//! # File Format
//!
//! ```toml
//! # Period between two background fetches (milliseconds)
//! poll_period_ms = 30000
//! # Delay before the first fetch of a new worker (milliseconds)
//! initial_delay_ms = 1000
//! # Keep per-node telemetry summaries for large-label mode
//! telemetry_overlay = true
//! # Default label position inside its zone (percent)
//! label_percent = 50
//! ```
//!
//! Every field is optional; missing fields take their defaults and a missing
//! file yields [`SyncConfig::default`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{DEFAULT_INITIAL_DELAY, DEFAULT_LABEL_PERCENT, DEFAULT_POLL_PERIOD};
use crate::core::SyncError;
use crate::worker::PollTiming;

/// Environment variable overriding the default configuration path.
pub const CONFIG_PATH_ENV: &str = "NETMAP_SYNC_CONFIG";

fn default_poll_period_ms() -> u64 {
    DEFAULT_POLL_PERIOD.as_millis() as u64
}

fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY.as_millis() as u64
}

fn default_label_percent() -> u8 {
    DEFAULT_LABEL_PERCENT
}

/// Settings shared by all synchronization components.
///
/// # Examples
///
/// ```rust,no_run
/// use netmap_sync::config::SyncConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = SyncConfig::load_with_optional(None).await?;
/// let timing = config.timing();
/// println!("polling every {:?}", timing.period);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Period between two background fetch iterations, in milliseconds.
    #[serde(default = "default_poll_period_ms")]
    pub poll_period_ms: u64,

    /// Delay before the first iteration of a new worker, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Whether views start with the per-node telemetry overlay enabled.
    #[serde(default)]
    pub telemetry_overlay: bool,

    /// Default label position inside its zone, in percent (0-100).
    #[serde(default = "default_label_percent")]
    pub label_percent: u8,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: default_poll_period_ms(),
            initial_delay_ms: default_initial_delay_ms(),
            telemetry_overlay: false,
            label_percent: DEFAULT_LABEL_PERCENT,
        }
    }
}

impl SyncConfig {
    /// Load configuration from an optional path.
    ///
    /// Without a path, the `NETMAP_SYNC_CONFIG` variable is consulted, then
    /// the default location. A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, is not valid
    /// TOML, or fails [`SyncConfig::validate`].
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = Self::resolve_path(path)?;

        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!(
                target: "config",
                "No configuration at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Path the configuration is read from: `path` if given, then
    /// `NETMAP_SYNC_CONFIG`, then [`SyncConfig::default_path`].
    pub fn resolve_path(path: Option<PathBuf>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path),
            None => match std::env::var_os(CONFIG_PATH_ENV) {
                Some(path) => Ok(PathBuf::from(path)),
                None => Self::default_path(),
            },
        }
    }

    /// Load configuration from a specific file path.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .map_err(SyncError::from)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Default configuration path: `~/.netmap-sync/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| SyncError::ConfigError {
            message: "Unable to determine home directory".to_string(),
        })?;
        Ok(home.join(".netmap-sync").join("config.toml"))
    }

    /// Reject values the workers or the label placer cannot use.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.poll_period_ms == 0 {
            return Err(SyncError::ConfigError {
                message: "poll_period_ms must be greater than zero".to_string(),
            });
        }
        if self.label_percent > 100 {
            return Err(SyncError::ConfigError {
                message: format!("label_percent must be at most 100, got {}", self.label_percent),
            });
        }
        Ok(())
    }

    /// Worker timing derived from this configuration.
    #[must_use]
    pub fn timing(&self) -> PollTiming {
        PollTiming::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.poll_period_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.poll_period_ms, 30_000);
        assert_eq!(config.initial_delay_ms, 1_000);
        assert_eq!(config.label_percent, 50);
        assert!(!config.telemetry_overlay);
        assert_eq!(config.timing().period, Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: SyncConfig = toml::from_str("poll_period_ms = 500").unwrap();
        assert_eq!(config.poll_period_ms, 500);
        assert_eq!(config.initial_delay_ms, 1_000);
        assert_eq!(config.label_percent, 50);
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let config = SyncConfig {
            poll_period_ms: 0,
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(SyncError::ConfigError { .. })));
    }

    #[test]
    fn test_validate_rejects_large_percent() {
        let config = SyncConfig {
            label_percent: 101,
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let config = SyncConfig {
            poll_period_ms: 250,
            initial_delay_ms: 10,
            telemetry_overlay: true,
            label_percent: 30,
        };
        config.save_to(&path).await.unwrap();

        let loaded = SyncConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_missing_file_yields_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let config = SyncConfig::load_with_optional(Some(path)).await.unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "poll_period_ms = 0\n").unwrap();
        assert!(SyncConfig::load_from(&path).await.is_err());

        std::fs::write(&path, "poll_period_ms = [").unwrap();
        assert!(SyncConfig::load_from(&path).await.is_err());
    }
}
