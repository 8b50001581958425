use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "shaman")]
#[command(about = "ShamanAI - chat, math help and handwriting recognition on hosted models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and store a Hugging Face access token
    Login {
        /// Token starting with `hf_`
        token: String,
    },
    /// Forget the stored access token
    Logout,
    /// Send a short probe to verify the token and endpoint
    Check,
    /// Ask a single question
    Ask {
        /// Prefer precise answers over creative ones
        #[arg(long)]
        fast: bool,
        /// The question
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Recognize handwritten text in an image
    Ocr {
        /// Path to the image file
        image: PathBuf,
    },
    /// Start an interactive chat (default)
    Chat,
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config and secret file locations
    Path,
    /// Print the effective configuration
    Show,
    /// Write the default configuration if no config file exists
    Init,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shaman=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Login { token } => commands::auth::login(&token).await?,
        Commands::Logout => commands::auth::logout().await?,
        Commands::Check => commands::auth::check().await?,
        Commands::Ask { fast, prompt } => commands::ask::ask(&prompt.join(" "), fast).await?,
        Commands::Ocr { image } => commands::ask::ocr(&image).await?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Show => commands::config::show()?,
            ConfigAction::Init => commands::config::init()?,
        },
    }

    Ok(())
}
