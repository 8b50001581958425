//! Storage layer for configuration and secrets.

mod config_storage;
mod secret_storage;

pub use config_storage::{ConfigStorage, ConfigStorageError};
pub use secret_storage::{SecretConfig, SecretStorage, SecretStorageError, TOKEN_ENV_VAR};

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes `content` to `path` via a temporary sibling file and an atomic rename.
///
/// The parent directory is created when missing. `mode` is applied to the
/// temporary file before the rename on Unix.
pub(crate) fn write_atomic(path: &Path, content: &[u8], mode: Option<u32>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path)?;
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(content)?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(mode))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    fs::rename(&tmp_path, path)
}

fn temp_path(path: &Path) -> std::io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Path has no file name")
    })?;
    let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}
