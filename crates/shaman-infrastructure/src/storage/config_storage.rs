//! Config file storage.
//!
//! Loads `ClientConfig` from `config.toml`. A missing or empty file yields the
//! defaults; keys absent from the file keep their default values.

use crate::paths::ShamanPaths;
use shaman_core::{ClientConfig, ShamanError};
use std::fs;
use std::path::PathBuf;

/// Errors that can occur during config storage operations.
#[derive(Debug)]
pub enum ConfigStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
    /// Config directory not found.
    ConfigDirNotFound,
}

impl std::fmt::Display for ConfigStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigStorageError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
            ConfigStorageError::ConfigDirNotFound => {
                write!(f, "Could not determine home directory")
            }
        }
    }
}

impl std::error::Error for ConfigStorageError {}

impl From<std::io::Error> for ConfigStorageError {
    fn from(e: std::io::Error) -> Self {
        ConfigStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigStorageError {
    fn from(e: toml::de::Error) -> Self {
        ConfigStorageError::TomlParseError(e)
    }
}

impl From<toml::ser::Error> for ConfigStorageError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigStorageError::TomlSerError(e)
    }
}

impl From<ConfigStorageError> for ShamanError {
    fn from(err: ConfigStorageError) -> Self {
        match err {
            ConfigStorageError::IoError(e) => e.into(),
            ConfigStorageError::TomlParseError(e) => e.into(),
            ConfigStorageError::TomlSerError(e) => ShamanError::Serialization {
                format: "TOML".to_string(),
                message: e.to_string(),
            },
            ConfigStorageError::ConfigDirNotFound => {
                ShamanError::config("Could not determine home directory")
            }
        }
    }
}

/// Storage for `config.toml`.
///
/// Responsibilities:
/// - Parse TOML into `ClientConfig`, filling gaps with defaults
/// - Write a config atomically (tmp file + rename)
///
/// Does NOT:
/// - Watch the file for changes
/// - Hold secrets (see `SecretStorage`)
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a ConfigStorage at the default path (~/.config/shaman/config.toml).
    pub fn new() -> Result<Self, ConfigStorageError> {
        let path = ShamanPaths::config_file().map_err(|_| ConfigStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    /// Creates a ConfigStorage with a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the config, returning defaults when the file is missing or empty.
    pub fn load(&self) -> Result<ClientConfig, ConfigStorageError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        let config: ClientConfig = toml::from_str(&content)?;
        tracing::debug!(path = %self.path.display(), "Loaded config file");
        Ok(config)
    }

    /// Saves the config atomically.
    pub fn save(&self, config: &ClientConfig) -> Result<(), ConfigStorageError> {
        let toml_string = toml::to_string_pretty(config)?;
        super::write_atomic(&self.path, toml_string.as_bytes(), None)?;
        Ok(())
    }
}
