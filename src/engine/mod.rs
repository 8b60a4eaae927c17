//! Dump engine
//!
//! Owns the pending queue and the active log file. A dump takes the whole
//! queue, appends it to `latest.log` in one write and rotates the file once
//! it grows past the size threshold. Dumps are serialized on `dump_lock`,
//! which is held from the drain through the size check, so file order is
//! enqueue order even with many writers.

pub mod queue;
pub mod rollover;
pub mod worker;

pub use queue::PendingQueue;
pub use rollover::{RolloverManager, RotateOutcome};
pub use worker::IntervalWorker;

use crate::config::DumpMode;
use crate::constants::{DUMP_FAILURE_EXIT_CODE, ROTATION_THRESHOLD_BYTES};
use crate::error::{LoggerError, Result};
use crate::logging::{Formatter, LogLevel};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// What a single dump cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpOutcome {
    /// Queue was empty; the file was not touched
    Empty,
    Written {
        lines: usize,
        bytes: u64,
        rotated: bool,
    },
}

pub struct DumpEngine {
    mode: DumpMode,
    active: PathBuf,
    queue: PendingQueue,
    rollover: RolloverManager,
    dump_lock: Mutex<()>,
    /// Renders the FATAL line emitted when the log cannot be persisted
    formatter: Formatter,
    threshold: u64,
}

impl DumpEngine {
    pub fn new(directory: &Path, active: PathBuf, mode: DumpMode, formatter: Formatter) -> Self {
        Self {
            mode,
            rollover: RolloverManager::new(directory, active.clone()),
            active,
            queue: PendingQueue::new(),
            dump_lock: Mutex::new(()),
            formatter,
            threshold: ROTATION_THRESHOLD_BYTES,
        }
    }

    pub fn mode(&self) -> DumpMode {
        self.mode
    }

    pub fn active_path(&self) -> &Path {
        &self.active
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Accept a rendered line. Immediate mode writes it before returning.
    pub fn enqueue(&self, line: String) {
        if self.mode == DumpMode::Never {
            return;
        }
        if !self.queue.push(line) {
            return;
        }
        if self.mode == DumpMode::Immediate {
            self.dump();
        }
    }

    /// Write all pending lines; a write failure terminates the process
    pub fn dump(&self) -> DumpOutcome {
        match self.try_dump() {
            Ok(outcome) => outcome,
            Err(e) => self.fail(e),
        }
    }

    /// Write all pending lines, returning the failure instead of exiting.
    ///
    /// On failure the lines go back to the front of the queue.
    pub fn try_dump(&self) -> Result<DumpOutcome> {
        let _guard = self.dump_lock.lock();
        self.drain_locked(true)
    }

    /// Retire the active file. With `force`, pending lines are flushed first.
    pub fn rotate(&self, force: bool) -> RotateOutcome {
        match self.try_rotate(force) {
            Ok(outcome) => outcome,
            Err(e) => self.fail(e),
        }
    }

    pub fn try_rotate(&self, force: bool) -> Result<RotateOutcome> {
        let _guard = self.dump_lock.lock();
        if force {
            self.drain_locked(false)?;
        }
        Ok(self.rollover.rotate())
    }

    fn drain_locked(&self, check_size: bool) -> Result<DumpOutcome> {
        let lines = self.queue.take();
        if lines.is_empty() {
            return Ok(DumpOutcome::Empty);
        }

        let mut output = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in &lines {
            output.push_str(line);
            output.push('\n');
        }

        if let Err(e) = self.append(output.as_bytes()) {
            self.queue.restore(lines);
            return Err(LoggerError::Write {
                path: self.active.clone(),
                source: e,
            });
        }
        let size = file_size(&self.active);
        debug!("Dumped {} lines ({} bytes) to {}", lines.len(), output.len(), self.active.display());

        let rotated = check_size && size > self.threshold && self.rollover.rotate().is_rotated();
        Ok(DumpOutcome::Written {
            lines: lines.len(),
            bytes: output.len() as u64,
            rotated,
        })
    }

    fn append(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.active)?;
        file.write_all(bytes)
    }

    fn fail(&self, e: LoggerError) -> ! {
        let line = self.formatter.render_with_error(
            LogLevel::Fatal,
            "Unable to save log to file!",
            &e,
            chrono::Local::now(),
        );
        eprintln!("{}", line);
        error!("{}", e);
        std::process::exit(DUMP_FAILURE_EXIT_CODE)
    }
}

/// Size of the file at `path`; 0 if it can't be read, so lines already
/// written are never queued again
fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}
