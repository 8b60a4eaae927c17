//! Line sinks
//!
//! A sink receives every emitted line after the dump engine accepted it.
//! The console sink is installed when `console` is enabled; callers can add
//! their own with `LogManager::add_sink`.

use super::LogEvent;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Destination for rendered lines other than the log file
pub trait Sink: Send + Sync {
    fn accept(&self, event: &LogEvent);
}

/// Writes each line to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn accept(&self, event: &LogEvent) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", event.line);
    }
}

/// Keeps every line in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines received so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Sink for MemorySink {
    fn accept(&self, event: &LogEvent) {
        self.lines.lock().push(event.line.clone());
    }
}
