//! Configuration management for Keyboard Debouncer
//!
//! Provides persistent configuration that is automatically saved to and loaded
//! from a platform-specific config file.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/keyboard-debouncer/config.toml` |
//! | macOS | `~/Library/Application Support/keyboard-debouncer/config.toml` |
//! | Windows | `%APPDATA%\keyboard-debouncer\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use keyboard_debouncer::Config;
//!
//! // Load existing config or use defaults
//! let mut config = Config::load().unwrap_or_default();
//!
//! // Modify settings
//! config.debounce.threshold_ms = 60;
//!
//! // Save to disk
//! config.save().expect("Failed to save config");
//! ```

use crate::control::{DEFAULT_RETRY_DELAY_MS, DEFAULT_THRESHOLD_MS, MAX_THRESHOLD_MS, MIN_THRESHOLD_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the per-user application directory
pub const APP_DIR: &str = "keyboard-debouncer";

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join(APP_DIR);

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Debounce settings (the persisted threshold and enabled flag)
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// Capture retry settings
    #[serde(default)]
    pub retry: RetryConfig,
    /// UI settings
    #[serde(default)]
    pub ui: UiConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Debounce configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebounceConfig {
    /// Minimum spacing between accepted events of the same key and direction
    pub threshold_ms: u64,
    /// Whether debouncing should run
    pub enabled: bool,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            threshold_ms: DEFAULT_THRESHOLD_MS,
            enabled: true,
        }
    }
}

impl DebounceConfig {
    /// Threshold limited to the supported range
    pub fn clamped_threshold(&self) -> u64 {
        self.threshold_ms.clamp(MIN_THRESHOLD_MS, MAX_THRESHOLD_MS)
    }
}

/// Capture retry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before re-trying a failed capture start
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    /// Refresh rate for UI updates (in Hz)
    pub refresh_rate_hz: u32,
    /// Color theme (dark/light)
    pub theme: Theme,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 30,
            theme: Theme::Dark,
        }
    }
}

/// Color theme options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Write logs to a file in the data directory (the TUI owns the terminal)
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get UI refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.ui.refresh_rate_hz.max(1) as u64)
    }

    /// Get capture retry delay as Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry.delay_ms)
    }
}
