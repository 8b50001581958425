//! Secret configuration file storage.
//!
//! Persists the Hugging Face token in `~/.config/shaman/secret.json`:
//!
//! ```json
//! { "huggingface": { "token": "hf_..." } }
//! ```

use crate::paths::ShamanPaths;
use serde::{Deserialize, Serialize};
use shaman_core::{Credential, CredentialSource, ShamanError};
use std::fs;
use std::path::PathBuf;

/// Environment variable consulted when the file holds no token.
pub const TOKEN_ENV_VAR: &str = "HF_TOKEN";

/// Reads an environment variable by name.
type EnvLookup = fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Errors that can occur during secret storage operations.
#[derive(Debug)]
pub enum SecretStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON parsing error.
    ParseError(serde_json::Error),
    /// Config directory not found.
    ConfigDirNotFound,
}

impl std::fmt::Display for SecretStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            SecretStorageError::ParseError(e) => write!(f, "JSON parse error: {}", e),
            SecretStorageError::ConfigDirNotFound => {
                write!(f, "Could not determine home directory")
            }
        }
    }
}

impl std::error::Error for SecretStorageError {}

impl From<std::io::Error> for SecretStorageError {
    fn from(e: std::io::Error) -> Self {
        SecretStorageError::IoError(e)
    }
}

impl From<serde_json::Error> for SecretStorageError {
    fn from(e: serde_json::Error) -> Self {
        SecretStorageError::ParseError(e)
    }
}

impl From<SecretStorageError> for ShamanError {
    fn from(err: SecretStorageError) -> Self {
        match err {
            SecretStorageError::IoError(e) => e.into(),
            SecretStorageError::ParseError(e) => e.into(),
            SecretStorageError::ConfigDirNotFound => {
                ShamanError::config("Could not determine home directory")
            }
        }
    }
}

/// Root structure of secret.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface: Option<HuggingFaceSecret>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceSecret {
    pub token: String,
}

/// Storage for the secret configuration file (secret.json).
///
/// Responsibilities:
/// - Load and save secret.json, written with permissions 600 on Unix
/// - Fall back to `HF_TOKEN` when the file holds no token
///
/// Does NOT:
/// - Check the token against the remote service
/// - Encrypt anything (plaintext JSON storage)
pub struct SecretStorage {
    path: PathBuf,
    env_lookup: Option<EnvLookup>,
}

impl SecretStorage {
    /// Creates a SecretStorage at the default path with the `HF_TOKEN` fallback enabled.
    pub fn new() -> Result<Self, SecretStorageError> {
        let path = ShamanPaths::secret_file().map_err(|_| SecretStorageError::ConfigDirNotFound)?;
        Ok(Self::with_path(path).with_env_lookup(process_env))
    }

    /// Creates a SecretStorage with a custom path and no environment fallback.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            env_lookup: None,
        }
    }

    /// Consults `lookup` for `HF_TOKEN` when the file holds no token.
    pub(crate) fn with_env_lookup(mut self, lookup: EnvLookup) -> Self {
        self.env_lookup = Some(lookup);
        self
    }

    /// Returns the path to the secret file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads secret.json. A missing or blank file yields an empty config.
    pub fn load_config(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Ok(SecretConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SecretConfig::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Writes secret.json atomically.
    pub fn save_config(&self, config: &SecretConfig) -> Result<(), SecretStorageError> {
        let json = serde_json::to_string_pretty(config)?;
        super::write_atomic(&self.path, json.as_bytes(), Some(0o600))?;
        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>, SecretStorageError> {
        let from_file = self
            .load_config()?
            .huggingface
            .map(|secret| secret.token)
            .filter(|token| !token.trim().is_empty());

        if from_file.is_some() {
            return Ok(from_file);
        }

        let from_env = self.env_token();
        if from_env.is_some() {
            tracing::debug!(var = TOKEN_ENV_VAR, "Using token from environment");
        }
        Ok(from_env)
    }

    fn env_token(&self) -> Option<String> {
        self.env_lookup
            .and_then(|lookup| lookup(TOKEN_ENV_VAR))
            .filter(|token| !token.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl CredentialSource for SecretStorage {
    async fn load(&self) -> shaman_core::Result<Option<Credential>> {
        match self.load_token()? {
            Some(token) => Credential::parse(&token).map(Some),
            None => Ok(None),
        }
    }

    async fn store(&self, credential: &Credential) -> shaman_core::Result<()> {
        let mut config = self.load_config()?;
        config.huggingface = Some(HuggingFaceSecret {
            token: credential.expose().to_string(),
        });
        self.save_config(&config)?;
        tracing::info!(path = %self.path.display(), "Stored Hugging Face token");
        Ok(())
    }

    async fn discard(&self) -> shaman_core::Result<()> {
        let mut config = self.load_config()?;
        if config.huggingface.take().is_some() {
            self.save_config(&config)?;
            tracing::info!(path = %self.path.display(), "Discarded stored Hugging Face token");
        }
        if self.env_token().is_some() {
            tracing::warn!(
                var = TOKEN_ENV_VAR,
                "Token is also set in the environment and will be used again until unset"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SecretStorage::with_path(temp_dir.path().join("secret.json"));

        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SecretStorage::with_path(temp_dir.path().join("nested").join("secret.json"));

        let credential = Credential::parse("hf_test_token").unwrap();
        storage.store(&credential).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded, Some(credential));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        let storage = SecretStorage::with_path(path.clone());

        storage
            .store(&Credential::parse("hf_test_token").unwrap())
            .await
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_discard_removes_token() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SecretStorage::with_path(temp_dir.path().join("secret.json"));

        storage
            .store(&Credential::parse("hf_test_token").unwrap())
            .await
            .unwrap();
        storage.discard().await.unwrap();

        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_discard_without_file_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        let storage = SecretStorage::with_path(path.clone());

        storage.discard().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_invalid_stored_token_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(&path, r#"{"huggingface": {"token": "not-a-hf-token"}}"#).unwrap();

        let storage = SecretStorage::with_path(path);
        assert!(matches!(
            storage.load().await,
            Err(ShamanError::Credential(_))
        ));
    }

    fn env_with_token(name: &str) -> Option<String> {
        (name == TOKEN_ENV_VAR).then(|| "hf_env_token".to_string())
    }

    fn env_with_blank(_name: &str) -> Option<String> {
        Some("   ".to_string())
    }

    #[tokio::test]
    async fn test_file_token_wins_over_env() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SecretStorage::with_path(temp_dir.path().join("secret.json"))
            .with_env_lookup(env_with_token);

        let stored = Credential::parse("hf_file_token").unwrap();
        storage.store(&stored).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_env_token_used_when_file_has_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(&path, r#"{"huggingface": {"token": "  "}}"#).unwrap();
        let storage = SecretStorage::with_path(path).with_env_lookup(env_with_token);

        assert_eq!(
            storage.load().await.unwrap(),
            Some(Credential::parse("hf_env_token").unwrap())
        );
    }

    #[tokio::test]
    async fn test_blank_env_token_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SecretStorage::with_path(temp_dir.path().join("secret.json"))
            .with_env_lookup(env_with_blank);

        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_discard_keeps_env_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SecretStorage::with_path(temp_dir.path().join("secret.json"))
            .with_env_lookup(env_with_token);

        storage
            .store(&Credential::parse("hf_file_token").unwrap())
            .await
            .unwrap();
        storage.discard().await.unwrap();

        assert_eq!(
            storage.load().await.unwrap(),
            Some(Credential::parse("hf_env_token").unwrap())
        );
    }

    #[tokio::test]
    async fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(&path, "{ invalid json").unwrap();

        let storage = SecretStorage::with_path(path);
        assert!(matches!(
            storage.load_config(),
            Err(SecretStorageError::ParseError(_))
        ));
    }
}
