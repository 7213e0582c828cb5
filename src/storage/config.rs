use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::host::Cue;
use crate::transform::{DEFAULT_REMOVE_PATTERN, TextFilter};

/// Errors raised while validating configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid remove_pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("interval_seconds must be a positive number, got {0}")]
    InvalidInterval(f64),

    #[error("timeout_minutes is too large: {0}")]
    InvalidTimeout(u64),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub autoinsert: AutoinsertConfig,
    #[serde(default)]
    pub transform: TransformConfig,
}

impl Config {
    /// Check values that serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.autoinsert.interval()?;
        self.autoinsert.timeout()?;
        TextFilter::from_config(&self.transform)?;
        Ok(())
    }
}

/// General configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Write logs to a rotating file in the data directory
    /// When false, logging goes through env_logger (RUST_LOG)
    #[serde(default = "default_log_to_file")]
    pub log_to_file: bool,

    /// Level written to the log file
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Level echoed to stderr alongside the log file
    #[serde(default = "default_echo_level")]
    pub echo_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            log_to_file: default_log_to_file(),
            log_level: default_log_level(),
            echo_level: default_echo_level(),
        }
    }
}

/// Settings for the auto-insert watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoinsertConfig {
    /// Cursor color while the watcher runs, empty for no change
    #[serde(default = "default_cursor_color")]
    pub cursor_color: String,

    /// Cue played on start, stop and paste: "beep", "none" or a sound file
    #[serde(default)]
    pub sound: Cue,

    /// Polling interval
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: f64,

    /// Stop after this many minutes without a clipboard change, 0 for never
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
}

impl AutoinsertConfig {
    /// Configured cursor color, None when the cursor should be left alone
    pub fn cursor_color(&self) -> Option<&str> {
        let color = self.cursor_color.trim();
        if color.is_empty() { None } else { Some(color) }
    }

    /// Polling interval as a Duration
    /// Rejects values that do not fit a Duration or round down to zero
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        let secs = self.interval_seconds;
        match Duration::try_from_secs_f64(secs) {
            Ok(interval) if !interval.is_zero() => Ok(interval),
            _ => Err(ConfigError::InvalidInterval(secs)),
        }
    }

    /// Idle timeout as a Duration, None when disabled
    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        match self.timeout_minutes {
            0 => Ok(None),
            minutes => minutes
                .checked_mul(60)
                .map(|secs| Some(Duration::from_secs(secs)))
                .ok_or(ConfigError::InvalidTimeout(minutes)),
        }
    }
}

impl Default for AutoinsertConfig {
    fn default() -> Self {
        AutoinsertConfig {
            cursor_color: default_cursor_color(),
            sound: Cue::default(),
            interval_seconds: default_interval_seconds(),
            timeout_minutes: default_timeout_minutes(),
        }
    }
}

/// Transforms applied to clipboard text before insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Strip leading spaces and tabs from inserted text
    #[serde(default = "default_trim_leading_whitespace")]
    pub trim_leading_whitespace: bool,

    /// Regular expression removed from inserted text, empty for none
    #[serde(default = "default_remove_pattern")]
    pub remove_pattern: String,

    /// Text inserted before each clip
    #[serde(default)]
    pub prefix: String,

    /// Newlines inserted after each clip
    #[serde(default = "default_trailing_newlines")]
    pub trailing_newlines: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            trim_leading_whitespace: default_trim_leading_whitespace(),
            remove_pattern: default_remove_pattern(),
            prefix: String::new(),
            trailing_newlines: default_trailing_newlines(),
        }
    }
}

// Default value functions for serde
fn default_log_to_file() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_echo_level() -> String {
    "warn".to_string()
}

fn default_cursor_color() -> String {
    "red".to_string()
}

fn default_interval_seconds() -> f64 {
    2.0
}

fn default_timeout_minutes() -> u64 {
    5
}

fn default_trim_leading_whitespace() -> bool {
    true
}

fn default_remove_pattern() -> String {
    DEFAULT_REMOVE_PATTERN.to_string()
}

fn default_trailing_newlines() -> usize {
    2
}

/// Trait for configuration storage
pub trait ConfigStorage {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        use anyhow::Context;
        use std::fs;

        // If file doesn't exist, create default and return it
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {:?}", self.path))?;

        log::info!("Loaded configuration from {:?}", self.path);
        log::debug!(
            "Config: interval={}s, timeout={}min, sound={}",
            config.autoinsert.interval_seconds,
            config.autoinsert.timeout_minutes,
            config.autoinsert.sound
        );

        Ok(config)
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        if self.path.exists() {
            return Ok(());
        }

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../clipmon.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}
