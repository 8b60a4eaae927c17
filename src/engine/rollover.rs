//! Active file rollover
//!
//! `latest.log` is retired by renaming it to
//! `"<creation> - <rotation>.log"` in the same directory. A name that is
//! already taken gets a `" (<0-999>)"` suffix. Renames that fail are retried
//! a few times with a fixed delay and then abandoned: the active file keeps
//! growing and the next trigger tries again.

use crate::constants::{
    ARCHIVE_DISAMBIGUATOR_RANGE, ARCHIVE_EXTENSION, ARCHIVE_TIMESTAMP_FORMAT,
    ROTATE_RETRY_ATTEMPTS, ROTATE_RETRY_DELAY_MS,
};
use crate::error::LoggerError;
use chrono::{DateTime, Local};
use rand::Rng;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Random draws before scanning the suffix range in order
const RANDOM_SUFFIX_DRAWS: u32 = 32;

/// Result of a rotation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotateOutcome {
    /// Active file moved to `archive`
    Rotated { archive: PathBuf },
    /// No active file exists
    NothingToRotate,
    /// Every rename attempt failed; the active file stays in place
    Abandoned { attempts: u32 },
}

impl RotateOutcome {
    pub fn is_rotated(&self) -> bool {
        matches!(self, Self::Rotated { .. })
    }
}

/// Archive file name for an active file created at `created` and retired at `rotated`
pub fn archive_name(created: DateTime<Local>, rotated: DateTime<Local>) -> String {
    format!(
        "{} - {}.{}",
        created.format(ARCHIVE_TIMESTAMP_FORMAT),
        rotated.format(ARCHIVE_TIMESTAMP_FORMAT),
        ARCHIVE_EXTENSION
    )
}

/// Archive name with a collision suffix inserted before the extension
pub fn disambiguated_name(created: DateTime<Local>, rotated: DateTime<Local>, suffix: u32) -> String {
    format!(
        "{} - {} ({}).{}",
        created.format(ARCHIVE_TIMESTAMP_FORMAT),
        rotated.format(ARCHIVE_TIMESTAMP_FORMAT),
        suffix,
        ARCHIVE_EXTENSION
    )
}

/// Run `op` once, then up to `retries` more times with `delay` between attempts.
///
/// `op` receives the zero-based attempt number. Returns the first success or
/// the last error together with the number of attempts made.
pub fn retry_with_backoff<T, E, F>(retries: u32, delay: Duration, mut op: F) -> Result<T, (E, u32)>
where
    E: fmt::Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                debug!("Attempt {} failed: {}, retrying", attempt + 1, e);
                attempt += 1;
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
            Err(e) => return Err((e, attempt + 1)),
        }
    }
}

/// Renames the active log file to archive names
#[derive(Debug, Clone)]
pub struct RolloverManager {
    directory: PathBuf,
    active: PathBuf,
    retries: u32,
    retry_delay: Duration,
}

impl RolloverManager {
    pub fn new(directory: impl Into<PathBuf>, active: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            active: active.into(),
            retries: ROTATE_RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(ROTATE_RETRY_DELAY_MS),
        }
    }

    /// Override the rename retry policy
    pub fn with_retry(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn active_path(&self) -> &Path {
        &self.active
    }

    /// Move the active file to a fresh archive name
    pub fn rotate(&self) -> RotateOutcome {
        if !self.active.exists() {
            return RotateOutcome::NothingToRotate;
        }

        let result = retry_with_backoff(self.retries, self.retry_delay, |_| {
            let created = creation_time(&self.active);
            let archive = self.archive_path(created, Local::now())?;
            fs::rename(&self.active, &archive).map_err(|e| LoggerError::Rotate {
                from: self.active.clone(),
                to: archive.clone(),
                source: e,
            })?;
            Ok::<_, LoggerError>(archive)
        });

        match result {
            Ok(archive) => {
                info!("Rotated log to {}", archive.display());
                RotateOutcome::Rotated { archive }
            }
            Err((e, attempts)) => {
                warn!("Giving up on log rotation after {} attempts: {}", attempts, e);
                RotateOutcome::Abandoned { attempts }
            }
        }
    }

    /// First free archive path for the given timestamps
    fn archive_path(&self, created: DateTime<Local>, rotated: DateTime<Local>) -> Result<PathBuf, LoggerError> {
        let plain = self.directory.join(archive_name(created, rotated));
        if !plain.exists() {
            return Ok(plain);
        }

        let mut rng = rand::thread_rng();
        let random = (0..RANDOM_SUFFIX_DRAWS).map(|_| rng.gen_range(0..ARCHIVE_DISAMBIGUATOR_RANGE));
        random
            .chain(0..ARCHIVE_DISAMBIGUATOR_RANGE)
            .map(|suffix| self.directory.join(disambiguated_name(created, rotated, suffix)))
            .find(|candidate| !candidate.exists())
            .ok_or_else(|| LoggerError::Rotate {
                from: self.active.clone(),
                to: plain.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "every archive name suffix is taken",
                ),
            })
    }
}

/// Birth time of `path`, falling back to its modification time, then to now
fn creation_time(path: &Path) -> DateTime<Local> {
    fs::metadata(path)
        .and_then(|meta| meta.created().or_else(|_| meta.modified()))
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now())
}
