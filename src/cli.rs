//! Command-line interface definition using clap
//!
//! Flags map onto `LoggerConfig` fields; see `Cli::to_config`.

use cl_logger::{DumpMode, LogLevel, LoggerConfig, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Write leveled log lines to a rotating latest.log
#[derive(Parser, Debug, Default)]
#[command(name = "cl-logger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output for the logger itself
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML config file (flags below override its values)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log directory (default: ./logs/)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Minimum level: all, debug, info, warn, error, fatal
    #[arg(long, value_name = "LEVEL")]
    pub min_level: Option<String>,

    /// Line pattern using %DATE%, %TYPE% and %MESSAGE%
    #[arg(long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// chrono format for %DATE%
    #[arg(long, value_name = "FORMAT")]
    pub date_format: Option<String>,

    /// When lines are written to disk
    #[arg(long, value_enum, value_name = "MODE")]
    pub dump_mode: Option<DumpModeArg>,

    /// Interval between background dumps in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Don't echo lines to stdout
    #[arg(long)]
    pub no_console: bool,

    /// Print every emitted line as a JSON event on stderr
    #[arg(long)]
    pub events: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpModeArg {
    Immediate,
    Interval,
    Manual,
    Never,
}

impl From<DumpModeArg> for DumpMode {
    fn from(arg: DumpModeArg) -> Self {
        match arg {
            DumpModeArg::Immediate => DumpMode::Immediate,
            DumpModeArg::Interval => DumpMode::Interval,
            DumpModeArg::Manual => DumpMode::Manual,
            DumpModeArg::Never => DumpMode::Never,
        }
    }
}

/// Subcommands (without one, lines are read from stdin and logged at INFO)
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log one line per message
    Write {
        /// Level of every message
        #[arg(long, short, default_value = "info")]
        level: String,

        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Flush and archive the current latest.log
    Rotate,

    /// Emit a heartbeat line periodically until Ctrl-C
    Stream {
        /// Milliseconds between lines
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        every_ms: u64,

        /// Stop after this many lines
        #[arg(long, value_name = "N")]
        count: Option<u64>,
    },
}

/// Level for `write`; `all` is only a threshold, so it emits as DEBUG
pub fn write_level(name: &str) -> LogLevel {
    match LogLevel::parse_lenient(name) {
        LogLevel::All => LogLevel::Debug,
        level => level,
    }
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    pub fn to_config(&self) -> Result<LoggerConfig> {
        let base = match &self.config {
            Some(path) => LoggerConfig::load(path)?,
            None => LoggerConfig::default(),
        };

        let mut builder = base.to_builder();
        if let Some(dir) = &self.dir {
            builder = builder.directory(dir.clone());
        }
        if let Some(level) = &self.min_level {
            builder = builder.min_level(LogLevel::parse_lenient(level));
        }
        if let Some(pattern) = &self.pattern {
            builder = builder.pattern(pattern.clone());
        }
        if let Some(format) = &self.date_format {
            builder = builder.date_format(format.clone());
        }
        if let Some(mode) = self.dump_mode {
            builder = builder.dump_mode(mode.into());
        }
        if let Some(ms) = self.interval_ms {
            builder = builder.dump_interval_ms(ms);
        }
        if self.no_console {
            builder = builder.console(false);
        }
        Ok(builder.build())
    }
}

// =============================================================================
// Tests
// =============================================================================
