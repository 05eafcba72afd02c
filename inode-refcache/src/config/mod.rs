//! Configuration for the inode cache and its logging.
//!
//! Settings come from an optional INI file (see [`ConfigFile`]); anything
//! not set there falls back to the defaults defined here.
//!
//! ```ini
//! [cache]
//! initial_capacity = 4096
//! leak_report_limit = 32
//!
//! [logging]
//! level = debug
//! file = /var/log/inode-refcache.log
//! ```

mod error;
mod file;

use std::path::PathBuf;

pub use error::ConfigError;
pub use file::ConfigFile;

/// Default number of table slots reserved at startup.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Default number of leaked entries listed individually at teardown.
pub const DEFAULT_LEAK_REPORT_LIMIT: usize = 32;

/// Default log level filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Inode cache settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Table slots reserved when the cache is created.
    pub initial_capacity: usize,

    /// Leaked entries logged one by one at teardown before summarizing.
    pub leak_report_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            leak_report_limit: DEFAULT_LEAK_REPORT_LIMIT,
        }
    }
}

impl CacheConfig {
    /// Set the initial table capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set how many leaked entries are listed individually.
    pub fn with_leak_report_limit(mut self, limit: usize) -> Self {
        self.leak_report_limit = limit;
        self
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when no log environment variable is set.
    pub level: String,

    /// Optional file receiving a copy of all log output.
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
        }
    }
}

impl LoggingConfig {
    /// Set the level filter directive.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Also write logs to `path`.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
}
