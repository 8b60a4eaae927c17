//! Log levels and the level gate
//!
//! `LogLevel` orders severities; `LevelGate` answers "is this level enabled"
//! for a configured minimum. The gate is computed once per logger so each
//! log call only reads a bool before doing any work.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Log severity, ordered from least to most severe.
///
/// `All` is only meaningful as a configured minimum and ranks as `Debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    #[default]
    All,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Every level that can be emitted (excludes `All`)
    pub const EMITTABLE: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Position in the severity order; `All` shares Debug's rank
    #[inline]
    pub fn severity(self) -> u8 {
        match self {
            Self::All | Self::Debug => 0,
            Self::Info => 1,
            Self::Warn => 2,
            Self::Error => 3,
            Self::Fatal => 4,
        }
    }

    /// Name substituted for `%TYPE%`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// Parse a level name, falling back to `All` for anything unrecognized
    pub fn parse_lenient(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            "fatal" => Self::Fatal,
            _ => Self::All,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str().to_ascii_lowercase())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&text))
    }
}

/// Precomputed enabled flags for a minimum level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelGate {
    minimum: LogLevel,
    debug: bool,
    info: bool,
    warn: bool,
    error: bool,
    fatal: bool,
}

impl LevelGate {
    pub fn new(minimum: LogLevel) -> Self {
        let floor = minimum.severity();
        Self {
            minimum,
            debug: LogLevel::Debug.severity() >= floor,
            info: LogLevel::Info.severity() >= floor,
            warn: LogLevel::Warn.severity() >= floor,
            error: LogLevel::Error.severity() >= floor,
            fatal: true,
        }
    }

    pub fn minimum(&self) -> LogLevel {
        self.minimum
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::All | LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
            LogLevel::Fatal => self.fatal,
        }
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.debug
    }

    pub fn is_info_enabled(&self) -> bool {
        self.info
    }

    pub fn is_warn_enabled(&self) -> bool {
        self.warn
    }

    pub fn is_error_enabled(&self) -> bool {
        self.error
    }

    pub fn is_fatal_enabled(&self) -> bool {
        self.fatal
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(LogLevel::All)
    }
}
