//! Bearer credential and the trait for where it is kept.

use std::fmt;

use crate::error::{Result, ShamanError};

/// Prefix every Hugging Face access token carries.
pub const TOKEN_PREFIX: &str = "hf_";

/// An opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validates and wraps a token. Surrounding whitespace is ignored.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ShamanError::credential("Token must not be empty"));
        }
        if !token.starts_with(TOKEN_PREFIX) {
            return Err(ShamanError::credential(format!(
                "Token must start with {TOKEN_PREFIX}"
            )));
        }
        Ok(Self(token.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

/// Supplies and persists the credential on behalf of the client.
///
/// # Security Note
///
/// Implementations should ensure that:
/// - Stored tokens have restrictive file permissions (e.g., 600 on Unix)
/// - Tokens are never logged or exposed in error messages
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Returns the stored credential, `None` when nothing is stored.
    async fn load(&self) -> Result<Option<Credential>>;

    /// Persists a credential, replacing any previous one.
    async fn store(&self, credential: &Credential) -> Result<()>;

    /// Forgets the stored credential. Called after `InvalidCredential`.
    async fn discard(&self) -> Result<()>;
}
