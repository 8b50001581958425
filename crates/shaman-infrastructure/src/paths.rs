//! Unified path management for shaman configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/shaman/            # Config directory
//! ├── config.toml              # Client configuration
//! └── secret.json              # Hugging Face token
//! ```
//!
//! `SHAMAN_CONFIG_DIR` overrides the directory.

use std::path::PathBuf;

/// Environment variable that replaces the default config directory.
pub const CONFIG_DIR_ENV_VAR: &str = "SHAMAN_CONFIG_DIR";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for shaman_core::ShamanError {
    fn from(err: PathError) -> Self {
        shaman_core::ShamanError::config(err.to_string())
    }
}

pub struct ShamanPaths;

impl ShamanPaths {
    /// Returns the shaman configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: `$SHAMAN_CONFIG_DIR`, or `~/.config/shaman/`
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV_VAR) {
            if !dir.is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }

        let home = dirs::home_dir().ok_or(PathError::HomeDirNotFound)?;
        Ok(home.join(".config").join("shaman"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// The file is written with permissions 600 on Unix.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_in_config_dir() {
        let config_dir = ShamanPaths::config_dir().unwrap();
        assert_eq!(ShamanPaths::config_file().unwrap(), config_dir.join("config.toml"));
        assert_eq!(ShamanPaths::secret_file().unwrap(), config_dir.join("secret.json"));
    }
}
