//! Configuration management for Clipo
//!
//! Handles loading and validation of TOML configuration files.

use crate::error::ConfigError;
use crate::logging::LogLevel;
use crate::retention::DEFAULT_RETENTION_DAYS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the data directory under the home directory
const DATA_DIR_NAME: &str = ".clipo";

/// Main configuration structure for Clipo
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Clipboard monitoring settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// New-item notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Storage-related settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Clipboard monitoring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Whether the poller starts active (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Change counter sampling interval in milliseconds (default: 500)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_interval_ms(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// Announce each new item (default: true)
    #[serde(default = "default_true")]
    pub show: bool,

    /// Ring the terminal bell on each new item (default: false)
    #[serde(default)]
    pub play_sound: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            show: true,
            play_sound: false,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base data directory (default: ~/.clipo/)
    #[serde(
        default = "default_data_dir",
        deserialize_with = "deserialize_data_dir"
    )]
    pub data_dir: PathBuf,

    /// Age in days after which non-favorite items are swept (default: 30)
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            retention_days: default_retention_days(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Minimum log level: trace, debug, info, warn, error (default: info)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Parsed level; falls back to info for unknown values
    pub fn log_level(&self) -> LogLevel {
        self.level.parse().unwrap_or_default()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    500
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_log_level() -> String {
    LogLevel::default().to_string()
}

/// Expands a leading tilde (~) to the home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    path.to_path_buf()
}

/// Custom deserializer for data_dir that expands tilde
fn deserialize_data_dir<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let path_str = String::deserialize(deserializer)?;
    Ok(expand_tilde(Path::new(&path_str)))
}

impl Config {
    /// Validates the configuration values
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if:
    /// - `monitor.interval_ms` is 0
    /// - `storage.retention_days` is 0
    /// - `logging.level` is not a known level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "interval_ms must be > 0".to_string(),
            ));
        }

        if self.storage.retention_days == 0 {
            return Err(ConfigError::InvalidValue(
                "retention_days must be > 0".to_string(),
            ));
        }

        if self.logging.level.parse::<LogLevel>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "level must be one of trace, debug, info, warn, error (got '{}')",
                self.logging.level
            )));
        }

        Ok(())
    }
}

/// Returns the default data directory (`~/.clipo`)
pub fn get_default_data_dir() -> PathBuf {
    default_data_dir()
}

/// Returns the default configuration file path (`~/.clipo/config.toml`)
pub fn get_default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Loads configuration from the specified path
///
/// A missing file is created with defaults. A file that fails to parse or
/// validate yields the default configuration with a warning.
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded or default configuration
/// * `Err(ConfigError)` - Only for IO errors during file creation
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = Config::default();
        let toml_str = toml::to_string_pretty(&default_config)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, &toml_str)?;

        tracing::info!("Created default configuration file at {:?}", path);
        return Ok(default_config);
    }

    let content = fs::read_to_string(path)?;

    let config: Config = match toml::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(
                "Failed to parse configuration file {:?}: {}. Using default configuration.",
                path,
                e
            );
            return Ok(Config::default());
        }
    };

    if let Err(e) = config.validate() {
        tracing::warn!(
            "Invalid configuration in {:?}: {}. Using default configuration.",
            path,
            e
        );
        return Ok(Config::default());
    }

    Ok(config)
}

/// Loads configuration from the default path (`~/.clipo/config.toml`)
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from_path(&get_default_config_path())
}
