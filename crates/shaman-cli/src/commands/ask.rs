use anyhow::{Result, bail};
use colored::Colorize;
use shaman_core::GenerationMode;
use shaman_infrastructure::SecretStorage;
use shaman_interaction::OcrOutcome;
use std::path::Path;

use super::utils;

pub async fn ask(prompt: &str, fast: bool) -> Result<()> {
    let secrets = SecretStorage::new()?;
    let mut client = utils::connect(&secrets).await?;
    if fast {
        client.set_mode(GenerationMode::Fast);
    }

    match client.submit_prompt(prompt).await {
        Ok(reply) => {
            println!("{}", reply);
            Ok(())
        }
        Err(err) => bail!(utils::handle_failure(&err, &secrets).await),
    }
}

pub async fn ocr(image: &Path) -> Result<()> {
    let secrets = SecretStorage::new()?;
    let client = utils::connect(&secrets).await?;
    let bytes = utils::read_image(image)?;

    match client.recognize_image_text(bytes).await {
        Ok(OcrOutcome::Recognized(text)) => {
            println!("{}", text);
            Ok(())
        }
        Ok(OcrOutcome::NotRecognized) => {
            println!("{}", "No text recognized".yellow());
            Ok(())
        }
        Err(err) => bail!(utils::handle_failure(&err, &secrets).await),
    }
}
