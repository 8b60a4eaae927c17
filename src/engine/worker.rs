//! Interval dump worker
//!
//! A dedicated thread that dumps the engine every interval. `recv_timeout`
//! on the stop channel doubles as the timer, so stopping wakes the thread
//! immediately instead of waiting out the current interval.

use super::DumpEngine;
use crate::error::{LoggerError, Result};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

pub struct IntervalWorker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalWorker {
    pub fn spawn(engine: Arc<DumpEngine>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("cl-logger-dump".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        engine.dump();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| LoggerError::Worker { source: e })?;

        debug!("Started interval dump worker ({:?})", interval);
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Signal the thread and wait for its current dump, if any, to finish
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            debug!("Stopped interval dump worker");
        }
    }
}

impl Drop for IntervalWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
