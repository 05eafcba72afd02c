//! INI-backed configuration file.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use tracing::debug;

use super::{CacheConfig, ConfigError, LoggingConfig};

/// Directory under the user config dir holding our files.
const APP_DIR: &str = "inode-refcache";

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.ini";

const CACHE_SECTION: &str = "cache";
const LOGGING_SECTION: &str = "logging";

/// Complete on-disk configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Default config path: `<config dir>/inode-refcache/config.ini`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load from the default path, or defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Loading config file");
        Self::parse(&contents)
    }

    /// Parse INI text. Keys that are absent keep their defaults.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(CACHE_SECTION)) {
            if let Some(capacity) = parse_key(section, CACHE_SECTION, "initial_capacity")? {
                config.cache.initial_capacity = capacity;
            }
            if let Some(limit) = parse_key(section, CACHE_SECTION, "leak_report_limit")? {
                config.cache.leak_report_limit = limit;
            }
        }

        if let Some(section) = ini.section(Some(LOGGING_SECTION)) {
            if let Some(level) = section.get("level") {
                let level = level.trim();
                if level.is_empty() {
                    return Err(invalid(LOGGING_SECTION, "level", level));
                }
                config.logging.level = level.to_string();
            }
            if let Some(file) = section.get("file") {
                let file = file.trim();
                config.logging.log_file = (!file.is_empty()).then(|| PathBuf::from(file));
            }
        }

        Ok(config)
    }

    /// Render as INI text, suitable for writing back to disk.
    pub fn to_ini_string(&self) -> io::Result<String> {
        let mut out = Vec::new();
        self.to_ini().write_to(&mut out)?;
        String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        self.to_ini().write_to_file(path).map_err(io_err)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some(CACHE_SECTION))
            .set("initial_capacity", self.cache.initial_capacity.to_string())
            .set("leak_report_limit", self.cache.leak_report_limit.to_string());

        let log_file = self
            .logging
            .log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        ini.with_section(Some(LOGGING_SECTION))
            .set("level", self.logging.level.as_str())
            .set("file", log_file);
        ini
    }
}

fn parse_key<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section_name, key, raw)),
    }
}

fn invalid(section: &str, key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}
