//! Tracing subscriber setup.
//!
//! Logs go to stderr, and optionally to a file through a non-blocking
//! appender. The filter is taken from `INODE_REFCACHE_LOG`, then `RUST_LOG`,
//! then the configured level.

use std::path::PathBuf;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Environment variable checked first for a filter directive.
pub const LOG_ENV_VAR: &str = "INODE_REFCACHE_LOG";

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured level is not a valid filter directive.
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// The log file path has no file name component.
    #[error("Invalid log file path: {}", .0.display())]
    InvalidLogFile(PathBuf),

    /// A global subscriber is already installed.
    #[error("Failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Build the filter for `config`, preferring environment overrides.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(&config.level))?;
    Ok(filter)
}

/// Install the global subscriber.
///
/// When a log file is configured the returned guard must be held for the
/// life of the process; dropping it stops the background writer and
/// flushes pending lines.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(config)?;
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(Rfc3339));

    match &config.log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| LoggingError::InvalidLogFile(path.clone()))?;
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTime::new(Rfc3339));

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()?;

            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_from_level() {
        let config = LoggingConfig::default().with_level("inode_refcache=debug");
        assert!(build_filter(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_file_display() {
        let err = LoggingError::InvalidLogFile(PathBuf::from("/"));
        assert!(err.to_string().contains("Invalid log file path"));
    }
}
