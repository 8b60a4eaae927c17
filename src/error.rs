//! Centralized error types for the logger
//!
//! All logger errors are represented by the `LoggerError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, LoggerError>`.
//!
//! None of these reach callers of the per-level logging API: log calls
//! either absorb the failure or, for dump writes, terminate the process.

use std::fmt;
use std::path::PathBuf;

/// All logger errors
#[derive(Debug)]
pub enum LoggerError {
    // === Filesystem ===
    /// Failed to create the log directory
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to append pending lines to the active file
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move the active file to its archive name
    Rotate {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    // === Configuration ===
    /// Failed to read a config file
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid TOML for `LoggerConfig`
    ConfigParse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    /// Invalid config value
    InvalidConfig { field: &'static str, reason: String },

    // === Runtime ===
    /// Failed to spawn the background dump worker
    Worker { source: std::io::Error },
}

impl std::error::Error for LoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CreateDir { source, .. }
            | Self::Write { source, .. }
            | Self::Rotate { source, .. }
            | Self::ConfigRead { source, .. }
            | Self::Worker { source } => Some(source),
            Self::ConfigParse { source, .. } => Some(source.as_ref()),
            Self::InvalidConfig { .. } => None,
        }
    }
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir { path, .. } => {
                write!(f, "Cannot create log directory: {}", path.display())
            }
            Self::Write { path, source } => {
                write!(f, "Unable to save log to file {}: {}", path.display(), source)
            }
            Self::Rotate { from, to, source } => write!(
                f,
                "Cannot move {} to {}: {}",
                from.display(),
                to.display(),
                source
            ),
            Self::ConfigRead { path, .. } => {
                write!(f, "Cannot read config file: {}", path.display())
            }
            Self::ConfigParse { path, source } => {
                write!(f, "Invalid config file {}: {}", path.display(), source)
            }
            Self::InvalidConfig { field, reason } => write!(f, "Invalid {}: {}", field, reason),
            Self::Worker { .. } => write!(f, "Failed to start dump worker"),
        }
    }
}

/// Alias for Result with LoggerError
pub type Result<T> = std::result::Result<T, LoggerError>;
