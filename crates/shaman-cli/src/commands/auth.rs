use anyhow::{Result, bail};
use colored::Colorize;
use shaman_core::CredentialSource;
use shaman_infrastructure::SecretStorage;

use super::utils;

pub async fn login(token: &str) -> Result<()> {
    let secrets = SecretStorage::new()?;
    utils::store_token(&secrets, token).await?;
    println!(
        "{}",
        format!("Token saved to {}", secrets.path().display()).green()
    );
    Ok(())
}

pub async fn logout() -> Result<()> {
    let secrets = SecretStorage::new()?;
    secrets.discard().await?;
    println!("{}", "Token removed".green());
    Ok(())
}

pub async fn check() -> Result<()> {
    let secrets = SecretStorage::new()?;
    let client = utils::connect(&secrets).await?;

    match client.check_connection().await {
        Ok(()) => {
            println!("{}", "Connected to the inference service".green());
            Ok(())
        }
        Err(err) => bail!(utils::handle_failure(&err, &secrets).await),
    }
}
