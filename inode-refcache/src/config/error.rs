//! Configuration error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read or written.
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid INI.
    #[error("Invalid config syntax: {0}")]
    Parse(String),

    /// A key holds a value of the wrong shape.
    #[error("Invalid value for [{section}] {key}: '{value}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            section: "cache".to_string(),
            key: "initial_capacity".to_string(),
            value: "lots".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("[cache]"));
        assert!(msg.contains("initial_capacity"));
        assert!(msg.contains("lots"));
    }

    #[test]
    fn test_config_error_io_display() {
        let err = ConfigError::Io {
            path: PathBuf::from("/etc/refcache.ini"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/etc/refcache.ini"));
    }
}
