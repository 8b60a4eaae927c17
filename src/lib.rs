//! cl-logger - leveled application logger with buffered dumps and rollover
//!
//! Lines are gated by level, rendered from a pattern, written to
//! `<directory>/latest.log` (immediately, on an interval, or on demand) and
//! echoed to sinks and subscribers. The active file is archived once it
//! passes 5 MiB, on request, and when the logger shuts down.
//!
//! ```no_run
//! use cl_logger::{LogLevel, LogManager};
//!
//! let logger = LogManager::builder()
//!     .directory("./logs/")
//!     .min_level(LogLevel::Info)
//!     .dump_every(5_000)
//!     .build()?;
//! logger.info("service started");
//! # Ok::<(), cl_logger::LoggerError>(())
//! ```

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod manager;

pub use config::{DumpMode, LoggerConfig, LoggerConfigBuilder};
pub use engine::{DumpOutcome, RotateOutcome};
pub use error::{LoggerError, Result};
pub use logging::{LevelGate, LogEvent, LogLevel, MemorySink, Sink, SubscriptionId};
pub use manager::{LogManager, LogManagerBuilder};
