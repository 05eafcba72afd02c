//! CLI error type.

use thiserror::Error;

use inode_refcache::config::ConfigError;
use inode_refcache::logging::LoggingError;
use inode_refcache::{InodeCacheError, StoreError};

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Cache error: {0}")]
    Cache(#[from] InodeCacheError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The soak run finished but its accounting did not add up.
    #[error("Soak verification failed: {0}")]
    SoakFailed(String),
}
