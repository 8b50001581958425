use anyhow::{Context, Result, bail};
use shaman_core::{ClientConfig, Credential, CredentialSource, ShamanError};
use shaman_infrastructure::{ConfigStorage, SecretStorage};
use shaman_interaction::InferenceClient;
use std::path::Path;

/// Loads `config.toml`, falling back to defaults.
pub fn load_config() -> Result<ClientConfig> {
    let storage = ConfigStorage::new()?;
    let config = storage
        .load()
        .with_context(|| format!("Failed to load {}", storage.path().display()))?;
    Ok(config)
}

/// Builds a client from the stored config and token.
///
/// Fails with a login hint when no token is stored.
pub async fn connect(secrets: &SecretStorage) -> Result<InferenceClient> {
    let Some(credential) = secrets.load().await? else {
        bail!("No Hugging Face token stored. Run `shaman login <TOKEN>` first.");
    };
    Ok(InferenceClient::new(load_config()?, credential)?)
}

/// Discards a rejected token and returns the text to show for `err`.
pub async fn handle_failure(err: &ShamanError, secrets: &SecretStorage) -> String {
    if err.requires_new_credential() {
        if let Err(discard_err) = secrets.discard().await {
            tracing::warn!(error = %discard_err, "Failed to discard rejected token");
        }
    }
    describe_failure(err)
}

/// User-facing text for a client failure.
pub fn describe_failure(err: &ShamanError) -> String {
    match err {
        ShamanError::ModelWarmingUp { retry_after } => format!(
            "The model is warming up. Try again in about {} seconds.",
            retry_after.as_secs_f64().ceil() as u64
        ),
        ShamanError::InvalidCredential => {
            "The token was rejected and has been forgotten. Run `shaman login <TOKEN>` with a valid one."
                .to_string()
        }
        ShamanError::Transport { message, .. } => match err.status() {
            Some(code) => format!("The inference service answered HTTP {code}: {message}"),
            None => format!("Could not reach the inference service: {message}"),
        },
        other => other.to_string(),
    }
}

/// Reads an image for OCR.
pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))
}

/// Validates and persists a token.
pub async fn store_token(secrets: &SecretStorage, token: &str) -> Result<Credential> {
    let credential = Credential::parse(token)?;
    secrets.store(&credential).await?;
    Ok(credential)
}
