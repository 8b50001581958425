use anyhow::Result;
use colored::Colorize;
use shaman_core::ClientConfig;
use shaman_infrastructure::{ConfigStorage, SecretStorage};

use super::utils;

pub fn path() -> Result<()> {
    println!("config: {}", ConfigStorage::new()?.path().display());
    println!("secret: {}", SecretStorage::new()?.path().display());
    Ok(())
}

pub fn show() -> Result<()> {
    let config = utils::load_config()?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn init() -> Result<()> {
    let storage = ConfigStorage::new()?;
    if storage.exists() {
        println!(
            "{}",
            format!("Config already exists at {}", storage.path().display()).yellow()
        );
        return Ok(());
    }

    storage.save(&ClientConfig::default())?;
    println!(
        "{}",
        format!("Wrote default config to {}", storage.path().display()).green()
    );
    Ok(())
}
