//! Error types for the Shaman client.

use std::time::Duration;
use thiserror::Error;

/// A shared error type for every Shaman crate.
///
/// The first four variants form the contract of the inference client; the
/// remaining ones cover input validation and the storage layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShamanError {
    /// The remote model is still loading (HTTP 503). Retry after the delay.
    #[error("Model is warming up, retry in {} seconds", .retry_after.as_secs())]
    ModelWarmingUp { retry_after: Duration },

    /// The bearer token was rejected (HTTP 401). Discard it and acquire a new one.
    #[error("Invalid Hugging Face token")]
    InvalidCredential,

    /// Any other transport failure. `status` is absent when no response arrived.
    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The response body matched none of the known shapes.
    #[error("Unrecognized response shape: {0}")]
    UnrecognizedResponseShape(String),

    /// Prompt was empty after trimming
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    /// Image upload had no bytes
    #[error("Image must not be empty")]
    EmptyImage,

    /// Credential failed validation before use
    #[error("Credential error: {0}")]
    Credential(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

impl ShamanError {
    /// Creates a Transport error with a status code
    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a Transport error for a request that never got a response
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Credential error
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// True only for errors the caller may retry unchanged after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ModelWarmingUp { .. })
    }

    /// True when the stored credential must be discarded and re-acquired.
    pub fn requires_new_credential(&self) -> bool {
        matches!(self, Self::InvalidCredential)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ModelWarmingUp { .. } => Some(503),
            Self::InvalidCredential => Some(401),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ShamanError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ShamanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ShamanError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// A type alias for `Result<T, ShamanError>`.
pub type Result<T> = std::result::Result<T, ShamanError>;
