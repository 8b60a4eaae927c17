//! Logger facade
//!
//! `LogManager` ties the pieces together: the level gate decides, the
//! formatter renders, the dump engine persists, then sinks and subscribers
//! see the line. It is an owned value; share it with `Arc` and it shuts
//! down (final dump, then rotation) when the last handle is dropped.

use crate::config::{DumpMode, LoggerConfig, LoggerConfigBuilder};
use crate::engine::{DumpEngine, DumpOutcome, IntervalWorker, RotateOutcome};
use crate::error::{LoggerError, Result};
use crate::logging::{
    ConsoleSink, Formatter, LevelGate, LogEvent, LogLevel, Sink, SubscriptionId, Subscribers,
};
use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use std::error::Error;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tracing::{debug, warn};

pub struct LogManager {
    config: LoggerConfig,
    gate: LevelGate,
    formatter: Formatter,
    engine: Arc<DumpEngine>,
    worker: Mutex<Option<IntervalWorker>>,
    console: Option<ConsoleSink>,
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
    subscribers: Subscribers,
    closed: AtomicBool,
    /// Held shared while a line is enqueued, exclusively while closing
    lifecycle: RwLock<()>,
}

impl LogManager {
    /// Create the log directory and start the logger.
    ///
    /// `DumpMode::Interval` also starts the background dump worker.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.directory).map_err(|e| LoggerError::CreateDir {
            path: config.directory.clone(),
            source: e,
        })?;
        let mut config = config;
        if let Ok(resolved) = fs::canonicalize(&config.directory) {
            config.directory = resolved;
        }

        let formatter = Formatter::new(config.pattern.clone(), config.date_format.clone());
        let engine = Arc::new(DumpEngine::new(
            &config.directory,
            config.active_path(),
            config.dump_mode,
            formatter.clone(),
        ));

        let worker = match config.dump_mode {
            DumpMode::Interval => Some(IntervalWorker::spawn(
                engine.clone(),
                config.dump_interval(),
            )?),
            _ => None,
        };

        debug!(
            "Logger ready: {} (min {}, {:?})",
            config.active_path().display(),
            config.min_level,
            config.dump_mode
        );

        Ok(Self {
            gate: LevelGate::new(config.min_level),
            console: config.console.then_some(ConsoleSink),
            config,
            formatter,
            engine,
            worker: Mutex::new(worker),
            sinks: RwLock::new(Vec::new()),
            subscribers: Subscribers::new(),
            closed: AtomicBool::new(false),
            lifecycle: RwLock::new(()),
        })
    }

    pub fn builder() -> LogManagerBuilder {
        LogManagerBuilder::default()
    }

    /// Flush this logger and build a new one from a modified copy of its config.
    ///
    /// Custom sinks and subscribers move to the new logger. The active file is
    /// not rotated. If the new config is rejected, this logger shuts down
    /// normally and the error is returned.
    pub fn reconfigure<F>(mut self, change: F) -> Result<LogManager>
    where
        F: FnOnce(LoggerConfigBuilder) -> LoggerConfigBuilder,
    {
        let config = change(self.config.to_builder()).build();
        let mut next = LogManager::new(config)?;

        self.close();
        self.stop_worker();
        self.engine.dump();

        next.sinks = RwLock::new(std::mem::take(&mut *self.sinks.write()));
        next.subscribers = std::mem::take(&mut self.subscribers);
        Ok(next)
    }

    // === Configuration ===

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn gate(&self) -> &LevelGate {
        &self.gate
    }

    pub fn pattern(&self) -> &str {
        self.formatter.pattern()
    }

    pub fn active_path(&self) -> &Path {
        self.engine.active_path()
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.gate.is_debug_enabled()
    }

    pub fn is_info_enabled(&self) -> bool {
        self.gate.is_info_enabled()
    }

    pub fn is_warn_enabled(&self) -> bool {
        self.gate.is_warn_enabled()
    }

    pub fn is_error_enabled(&self) -> bool {
        self.gate.is_error_enabled()
    }

    pub fn is_fatal_enabled(&self) -> bool {
        self.gate.is_fatal_enabled()
    }

    // === Outputs ===

    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        self.sinks.write().push(sink);
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscribe_channel(&self) -> mpsc::Receiver<LogEvent> {
        self.subscribers.channel()
    }

    // === Logging ===

    /// Emit `message` at `level`. Disabled levels and empty messages do nothing.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if !self.accepts(level) {
            return;
        }
        let message = message.as_ref();
        if message.is_empty() {
            return;
        }
        let now = Local::now();
        let line = self.formatter.render(level, message, now);
        self.publish(level, now, line);
    }

    /// Emit one independent line per message
    pub fn log_all<I>(&self, level: LogLevel, messages: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if !self.accepts(level) {
            return;
        }
        for message in messages {
            self.log(level, message);
        }
    }

    /// Emit `message` followed by a line describing `error`
    pub fn log_with_error<E>(&self, level: LogLevel, message: impl AsRef<str>, error: &E)
    where
        E: Error + ?Sized,
    {
        if !self.accepts(level) {
            return;
        }
        let message = message.as_ref();
        if message.is_empty() {
            return;
        }
        let now = Local::now();
        let line = self.formatter.render_with_error(level, message, error, now);
        self.publish(level, now, line);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn debug_all<I: IntoIterator>(&self, messages: I)
    where
        I::Item: AsRef<str>,
    {
        self.log_all(LogLevel::Debug, messages);
    }

    pub fn debug_with_error<E: Error + ?Sized>(&self, message: impl AsRef<str>, error: &E) {
        self.log_with_error(LogLevel::Debug, message, error);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn info_all<I: IntoIterator>(&self, messages: I)
    where
        I::Item: AsRef<str>,
    {
        self.log_all(LogLevel::Info, messages);
    }

    pub fn info_with_error<E: Error + ?Sized>(&self, message: impl AsRef<str>, error: &E) {
        self.log_with_error(LogLevel::Info, message, error);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn warn_all<I: IntoIterator>(&self, messages: I)
    where
        I::Item: AsRef<str>,
    {
        self.log_all(LogLevel::Warn, messages);
    }

    pub fn warn_with_error<E: Error + ?Sized>(&self, message: impl AsRef<str>, error: &E) {
        self.log_with_error(LogLevel::Warn, message, error);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    pub fn error_all<I: IntoIterator>(&self, messages: I)
    where
        I::Item: AsRef<str>,
    {
        self.log_all(LogLevel::Error, messages);
    }

    pub fn error_with_error<E: Error + ?Sized>(&self, message: impl AsRef<str>, error: &E) {
        self.log_with_error(LogLevel::Error, message, error);
    }

    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }

    pub fn fatal_all<I: IntoIterator>(&self, messages: I)
    where
        I::Item: AsRef<str>,
    {
        self.log_all(LogLevel::Fatal, messages);
    }

    pub fn fatal_with_error<E: Error + ?Sized>(&self, message: impl AsRef<str>, error: &E) {
        self.log_with_error(LogLevel::Fatal, message, error);
    }

    // === File control ===

    /// Lines waiting for the next dump
    pub fn pending(&self) -> usize {
        self.engine.pending()
    }

    /// Write pending lines now
    pub fn dump(&self) -> DumpOutcome {
        self.engine.dump()
    }

    /// Flush pending lines and retire the active file
    pub fn rotate(&self) -> RotateOutcome {
        self.engine.rotate(true)
    }

    /// Stop the worker, flush, and rotate. Returns `None` if already shut down.
    ///
    /// Log calls made after shutdown are ignored.
    pub fn shutdown(&self) -> Option<RotateOutcome> {
        if !self.close() {
            return None;
        }
        self.stop_worker();
        let outcome = self.engine.rotate(true);
        debug!("Logger shut down: {:?}", outcome);
        Some(outcome)
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn accepts(&self, level: LogLevel) -> bool {
        self.gate.is_enabled(level) && !self.closed.load(Ordering::Relaxed)
    }

    /// Mark the logger closed. Returns false if it already was.
    ///
    /// Waits for lines being enqueued, so the final drain sees all of them.
    fn close(&self) -> bool {
        let _closing = self.lifecycle.write();
        !self.closed.swap(true, Ordering::SeqCst)
    }

    fn publish(&self, level: LogLevel, now: DateTime<Local>, line: String) {
        {
            let _open = self.lifecycle.read();
            if self.closed.load(Ordering::SeqCst) {
                return;
            }
            self.engine.enqueue(line.clone());
        }

        let event = LogEvent::new(level, now, line);
        if let Some(console) = &self.console {
            console.accept(&event);
        }
        for (index, sink) in self.sinks.read().iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| sink.accept(&event))).is_err() {
                warn!("Log sink #{} panicked, continuing", index);
            }
        }
        self.subscribers.notify(&event);
    }

    fn stop_worker(&self) {
        if let Some(mut worker) = self.worker.lock().take() {
            worker.stop();
        }
    }
}

impl Drop for LogManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Convenience builder: config setters plus `build()` into a running logger
#[derive(Debug, Clone, Default)]
pub struct LogManagerBuilder {
    config: LoggerConfigBuilder,
}

impl LogManagerBuilder {
    pub fn directory(mut self, directory: impl Into<std::path::PathBuf>) -> Self {
        self.config = self.config.directory(directory);
        self
    }

    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config = self.config.min_level(level);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config = self.config.pattern(pattern);
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.config = self.config.date_format(format);
        self
    }

    pub fn dump_mode(mut self, mode: DumpMode) -> Self {
        self.config = self.config.dump_mode(mode);
        self
    }

    pub fn dump_every(mut self, interval_ms: u64) -> Self {
        self.config = self.config.dump_every(interval_ms);
        self
    }

    pub fn console(mut self, enabled: bool) -> Self {
        self.config = self.config.console(enabled);
        self
    }

    pub fn build(self) -> Result<LogManager> {
        LogManager::new(self.config.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, AtomicUsize};

    fn unique_temp_dir() -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let base = std::env::temp_dir();
        let pid = std::process::id();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        base.join(format!("cl-logger-manager-{}-{}-{}", pid, ts, n))
    }

    fn quiet(dir: &Path) -> LogManagerBuilder {
        LogManager::builder().directory(dir).console(false)
    }

    fn read_active(logger: &LogManager) -> String {
        fs::read_to_string(logger.active_path()).unwrap_or_default()
    }

    #[test]
    fn test_new_creates_directory() {
        let dir = unique_temp_dir().join("nested");
        let logger = quiet(&dir).build().unwrap();

        assert!(dir.is_dir());
        assert!(logger.active_path().ends_with("latest.log"));
        assert!(!logger.active_path().exists());

        drop(logger);
        let _ = fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn test_disabled_level_has_no_effects() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir)
            .min_level(LogLevel::Warn)
            .dump_mode(DumpMode::Manual)
            .build()
            .unwrap();
        let sink = MemorySink::new();
        logger.add_sink(Arc::new(sink.clone()));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        logger.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        logger.debug("x");
        logger.info("x");
        logger.info_all(["y", "z"]);
        logger.info_with_error("x", &std::io::Error::new(std::io::ErrorKind::Other, "e"));

        assert_eq!(logger.pending(), 0);
        assert!(sink.lines().is_empty());
        assert_eq!(notified.load(Ordering::SeqCst), 0);

        drop(logger);
        assert!(!dir.join("latest.log").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_warn_line_matches_pattern() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir).min_level(LogLevel::Warn).build().unwrap();

        logger.info("x");
        assert!(!logger.active_path().exists());

        logger.warn("x");
        let content = read_active(&logger);
        let line = content.lines().next().unwrap();
        assert!(line.starts_with("[ WARN: "));
        assert!(line.ends_with(" ]: x"));

        drop(logger);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_message_is_ignored() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir).pattern("%MESSAGE%").build().unwrap();
        let events = logger.subscribe_channel();

        logger.info("");
        logger.info_all(["", "kept", ""]);

        assert_eq!(read_active(&logger), "kept\n");
        assert_eq!(events.try_iter().count(), 1);

        drop(logger);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_subscriber_gets_written_line() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir).pattern("%TYPE% %MESSAGE%").build().unwrap();
        let events = logger.subscribe_channel();

        logger.error("broken");

        let event = events.try_recv().unwrap();
        assert_eq!(event.level, LogLevel::Error);
        assert_eq!(event.line, "ERROR broken");
        assert_eq!(read_active(&logger), "ERROR broken\n");

        drop(logger);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_panicking_subscriber_does_not_abort_write() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir).pattern("%MESSAGE%").build().unwrap();
        logger.subscribe(|_| panic!("bad subscriber"));

        logger.info("first");
        logger.info("second");

        assert_eq!(read_active(&logger), "first\nsecond\n");

        drop(logger);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_error_detail_is_written() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir).pattern("%TYPE%: %MESSAGE%").build().unwrap();
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config missing");

        logger.error_with_error("startup failed", &err);

        let content = read_active(&logger);
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("ERROR: startup failed"));
        assert_eq!(lines.next(), Some("[Exception Error: config missing]"));

        drop(logger);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_shutdown_flushes_then_rotates() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir)
            .pattern("%MESSAGE%")
            .dump_mode(DumpMode::Manual)
            .build()
            .unwrap();
        logger.info("queued");
        assert_eq!(logger.pending(), 1);

        let outcome = logger.shutdown().unwrap();

        let archive = match outcome {
            RotateOutcome::Rotated { archive } => archive,
            other => panic!("Expected Rotated, got {:?}", other),
        };
        assert_eq!(fs::read_to_string(archive).unwrap(), "queued\n");
        assert!(logger.shutdown().is_none());

        logger.info("after shutdown");
        assert_eq!(logger.pending(), 0);

        drop(logger);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_drop_runs_shutdown() {
        let dir = unique_temp_dir();
        {
            let logger = quiet(&dir).dump_every(60_000).build().unwrap();
            logger.info("buffered");
            assert_eq!(logger.pending(), 1);
        }

        let files: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(|e| e.ok()).collect();
        assert_eq!(files.len(), 1);
        assert_ne!(files[0].file_name(), "latest.log");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reconfigure_flushes_and_keeps_subscribers() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir)
            .pattern("%MESSAGE%")
            .dump_mode(DumpMode::Manual)
            .build()
            .unwrap();
        let events = logger.subscribe_channel();
        logger.info("old");

        let logger = logger
            .reconfigure(|b| b.min_level(LogLevel::Error).dump_mode(DumpMode::Immediate))
            .unwrap();
        logger.info("filtered");
        logger.error("new");

        assert_eq!(logger.config().min_level, LogLevel::Error);
        assert_eq!(read_active(&logger), "old\nnew\n");
        let lines: Vec<String> = events.try_iter().map(|e| e.line).collect();
        assert_eq!(lines, vec!["old", "new"]);

        drop(logger);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        match LogManager::new(LoggerConfig::builder().pattern("").build()) {
            Err(LoggerError::InvalidConfig { field, .. }) => assert_eq!(field, "pattern"),
            Err(other) => panic!("Expected InvalidConfig, got {}", other),
            Ok(_) => panic!("Expected an empty pattern to be rejected"),
        }
    }

    struct PanicSink;

    impl Sink for PanicSink {
        fn accept(&self, _event: &LogEvent) {
            panic!("bad sink");
        }
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let dir = unique_temp_dir();
        let logger = quiet(&dir).pattern("%MESSAGE%").build().unwrap();
        let after = MemorySink::new();
        logger.add_sink(Arc::new(PanicSink));
        logger.add_sink(Arc::new(after.clone()));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        logger.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| logger.info("hello")));

        assert!(result.is_ok());
        assert_eq!(after.lines(), vec!["hello".to_string()]);
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert_eq!(read_active(&logger), "hello\n");

        drop(logger);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_no_line_left_behind_by_concurrent_shutdown() {
        for mode in [DumpMode::Manual, DumpMode::Immediate] {
            let dir = unique_temp_dir();
            let logger = Arc::new(quiet(&dir).pattern("%MESSAGE%").dump_mode(mode).build().unwrap());

            let writers: Vec<_> = (0..4)
                .map(|t| {
                    let logger = logger.clone();
                    std::thread::spawn(move || {
                        let mut i = 0;
                        while !logger.is_shut_down() {
                            logger.info(format!("{}/{}", t, i));
                            i += 1;
                        }
                        logger.info("late");
                    })
                })
                .collect();
            std::thread::sleep(std::time::Duration::from_millis(20));

            assert!(logger.shutdown().is_some());
            for writer in writers {
                writer.join().unwrap();
            }

            assert_eq!(logger.pending(), 0);
            assert!(!logger.active_path().exists());

            drop(logger);
            let _ = fs::remove_dir_all(&dir);
        }
    }
}
