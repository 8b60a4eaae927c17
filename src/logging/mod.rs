//! Line-level logging types
//!
//! Everything a log call touches before the dump engine:
//! - `LogLevel` / `LevelGate` - severity order and enabled flags
//! - `Formatter` - pattern rendering
//! - `Sink` - console and custom line destinations
//! - `Subscribers` - per-line notifications

pub mod entry;
pub mod format;
pub mod level;
pub mod sink;
pub mod subscribers;

pub use entry::LogEvent;
pub use format::Formatter;
pub use level::{LevelGate, LogLevel};
pub use sink::{ConsoleSink, MemorySink, Sink};
pub use subscribers::{SubscriptionId, Subscribers};

/// Initialize internal tracing for the logger's own diagnostics
///
/// Call early in main() before any logging occurs.
/// Set `verbose` to true for debug-level output.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "warn" };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(tracing_subscriber::EnvFilter::new(level))
        .try_init();
}
