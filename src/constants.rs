//! Logger constants
//!
//! File names, rotation limits and defaults shared by config and engine.

// =============================================================================
// Files
// =============================================================================

/// Default log directory (relative to the working directory)
pub const DEFAULT_LOG_DIR: &str = "./logs/";

/// Name of the active log file inside the log directory
pub const LATEST_LOG_NAME: &str = "latest.log";

/// Extension used for archived log files
pub const ARCHIVE_EXTENSION: &str = "log";

/// chrono format for both timestamps in an archive name
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "(%Y-%m-%d) %H-%M-%S-%3f";

/// Upper bound (exclusive) of the random collision suffix
pub const ARCHIVE_DISAMBIGUATOR_RANGE: u32 = 1000;

// =============================================================================
// Rotation
// =============================================================================

/// Active file size that triggers a rotation after a dump (5 MiB)
pub const ROTATION_THRESHOLD_BYTES: u64 = 5 * 1024 * 1024;

/// Additional rename attempts after the first one fails
pub const ROTATE_RETRY_ATTEMPTS: u32 = 3;

/// Delay between rename attempts (milliseconds)
pub const ROTATE_RETRY_DELAY_MS: u64 = 500;

// =============================================================================
// Formatting
// =============================================================================

/// Default line pattern
pub const DEFAULT_PATTERN: &str = "[ %TYPE%: %DATE% ]: %MESSAGE%";

/// Default chrono format substituted for `%DATE%`
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

// =============================================================================
// Dumping
// =============================================================================

/// Default interval between background dumps (milliseconds)
pub const DEFAULT_DUMP_INTERVAL_MS: u64 = 10_000;

/// Smallest interval accepted for the background worker (milliseconds)
pub const MIN_DUMP_INTERVAL_MS: u64 = 10;

/// Process exit code used when the log cannot be persisted
pub const DUMP_FAILURE_EXIT_CODE: i32 = 2;
