//! Configuration management for gatelog.
//!
//! Configuration loading and validation using figment, supporting TOML
//! config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "gatelog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "gatelog.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `GATELOG_`)
/// 2. TOML config file at `~/.config/gatelog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Access-control configuration.
    pub access: AccessConfig,
    /// Scanner configuration.
    pub scanner: ScannerConfig,
    /// Upload configuration.
    pub upload: UploadConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/gatelog/gatelog.db`
    pub database_path: Option<PathBuf>,
}

/// Access-control configuration.
///
/// `operators` maps an operator name to the single role it holds. The
/// role names below pick which role each gated command requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Operator name to role mapping.
    pub operators: BTreeMap<String, String>,
    /// Role required by the scan and logs commands.
    pub scan_role: String,
    /// Role required by the dashboard command.
    pub dashboard_role: String,
}

/// Scanner-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Seconds an identical code is suppressed after an accepted detection.
    pub cooldown_secs: f64,
    /// Capacity of the detection channel between source and session.
    pub channel_capacity: usize,
}

/// Upload-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Number of parsed rows shown in the pre-upload preview.
    pub preview_rows: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            operators: BTreeMap::new(),
            scan_role: "scanner".to_string(),
            dashboard_role: "admin".to_string(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 2.0,
            channel_capacity: 64,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { preview_rows: 5 }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("GATELOG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.scanner.cooldown_secs > 0.0 && self.scanner.cooldown_secs.is_finite()) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "cooldown_secs must be a positive number, got {}",
                    self.scanner.cooldown_secs
                ),
            });
        }

        if self.scanner.channel_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "channel_capacity must be greater than 0".to_string(),
            });
        }

        if self.access.scan_role.is_empty() || self.access.dashboard_role.is_empty() {
            return Err(Error::ConfigValidation {
                message: "scan_role and dashboard_role must not be empty".to_string(),
            });
        }

        for (name, role) in &self.access.operators {
            if role.is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("operator '{name}' has an empty role"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the scanner cooldown as a Duration.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.scanner.cooldown_secs)
    }
}
