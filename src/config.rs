//! Logger configuration
//!
//! `LoggerConfig` is an immutable value: a running `LogManager` never
//! changes it. Use `LoggerConfig::builder()` (or `to_builder()` on an
//! existing value) to produce a new one, or load it from a TOML file.

use crate::constants::{
    DEFAULT_DATE_FORMAT, DEFAULT_DUMP_INTERVAL_MS, DEFAULT_LOG_DIR, DEFAULT_PATTERN,
    LATEST_LOG_NAME, MIN_DUMP_INTERVAL_MS,
};
use crate::error::{LoggerError, Result};
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Dump Mode
// =============================================================================

/// When queued lines reach the active log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DumpMode {
    /// Every line is written before the log call returns
    #[default]
    Immediate,
    /// Lines queue up and a background worker writes them every `dump_interval_ms`
    Interval,
    /// Lines queue up until `dump()`, `rotate()` or shutdown
    Manual,
    /// Nothing is written to disk; sinks and subscribers still see every line
    Never,
}

// =============================================================================
// Logger Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Directory holding `latest.log` and its archives
    pub directory: PathBuf,
    /// Least severe level that is emitted
    pub min_level: LogLevel,
    /// Line pattern with `%DATE%`, `%TYPE%` and `%MESSAGE%` tokens
    pub pattern: String,
    /// chrono format substituted for `%DATE%`
    pub date_format: String,
    pub dump_mode: DumpMode,
    /// Background dump period for `DumpMode::Interval`
    pub dump_interval_ms: u64,
    /// Echo every line to stdout
    pub console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            min_level: LogLevel::All,
            pattern: DEFAULT_PATTERN.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            dump_mode: DumpMode::Immediate,
            dump_interval_ms: DEFAULT_DUMP_INTERVAL_MS,
            console: true,
        }
    }
}

impl LoggerConfig {
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::default()
    }

    /// Builder seeded with this configuration
    pub fn to_builder(&self) -> LoggerConfigBuilder {
        LoggerConfigBuilder {
            config: self.clone(),
        }
    }

    /// Path of the active log file
    pub fn active_path(&self) -> PathBuf {
        self.directory.join(LATEST_LOG_NAME)
    }

    /// Dump interval, clamped to a minimum so the worker never spins
    pub fn dump_interval(&self) -> Duration {
        Duration::from_millis(self.dump_interval_ms.max(MIN_DUMP_INTERVAL_MS))
    }

    /// Load a config from a TOML file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LoggerError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| LoggerError::ConfigParse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject values no logger can work with
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(LoggerError::InvalidConfig {
                field: "directory",
                reason: "must not be empty".into(),
            });
        }
        if self.pattern.is_empty() {
            return Err(LoggerError::InvalidConfig {
                field: "pattern",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Builder
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.directory = directory.into();
        self
    }

    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config.min_level = level;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.config.date_format = format.into();
        self
    }

    pub fn dump_mode(mut self, mode: DumpMode) -> Self {
        self.config.dump_mode = mode;
        self
    }

    /// Switch to `DumpMode::Interval` with the given period
    pub fn dump_every(mut self, interval_ms: u64) -> Self {
        self.config.dump_mode = DumpMode::Interval;
        self.config.dump_interval_ms = interval_ms;
        self
    }

    pub fn dump_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.dump_interval_ms = interval_ms;
        self
    }

    pub fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    pub fn build(self) -> LoggerConfig {
        self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
