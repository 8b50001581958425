//! Interactive chat REPL.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use shaman_core::{Credential, CredentialSource, GenerationMode, ShamanError, TaskHint};
use shaman_infrastructure::SecretStorage;
use shaman_interaction::{InferenceClient, OcrOutcome, QuickAction};

use super::utils;

const SLASH_COMMANDS: [&str; 10] = [
    "/reset",
    "/mode",
    "/history",
    "/ocr",
    "/example",
    "/physics",
    "/chemistry",
    "/help",
    "/quit",
    "/exit",
];

/// Commands whose single argument comes from a fixed list.
const COMMAND_ARGUMENTS: [(&str, &[&str]); 2] = [
    ("/mode", &["smart", "fast"]),
    ("/example", &["math", "geometry"]),
];

type ChatEditor = Editor<CliHelper, DefaultHistory>;

/// rustyline helper: completes and hints slash commands and their fixed arguments.
#[derive(Clone)]
struct CliHelper;

impl CliHelper {
    /// Byte offset of the word being typed and the words that can complete it.
    fn candidates(line: &str) -> (usize, Vec<&'static str>) {
        if !line.starts_with('/') {
            return (0, vec![]);
        }

        match line.split_once(' ') {
            None => (
                0,
                SLASH_COMMANDS
                    .into_iter()
                    .filter(|cmd| cmd.starts_with(line))
                    .collect(),
            ),
            Some((command, arg)) => {
                let arg = arg.trim_start();
                let start = line.len() - arg.len();
                let options = COMMAND_ARGUMENTS
                    .iter()
                    .find(|(name, _)| *name == command)
                    .map(|(_, options)| *options)
                    .unwrap_or_default();
                (
                    start,
                    options
                        .iter()
                        .copied()
                        .filter(|option| option.starts_with(arg))
                        .collect(),
                )
            }
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = Self::candidates(&line[..pos]);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        match line.split_once(' ') {
            Some((command, rest)) => Owned(format!("{} {}", command.bright_cyan(), rest)),
            None => Owned(line.bright_cyan().to_string()),
        }
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let (start, words) = Self::candidates(line);
        let typed = &line[start..];
        words
            .into_iter()
            .find(|word| word.len() > typed.len())
            .map(|word| word[typed.len()..].to_string())
    }
}

impl Validator for CliHelper {}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
enum ReplCommand {
    Prompt(String),
    Reset,
    ShowMode,
    SetMode(GenerationMode),
    History,
    Ocr(PathBuf),
    Quick(QuickAction),
    Help,
    Quit,
}

impl ReplCommand {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if !line.starts_with('/') {
            return Ok(ReplCommand::Prompt(line.to_string()));
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        match name {
            "/reset" => Ok(ReplCommand::Reset),
            "/mode" if arg.is_empty() => Ok(ReplCommand::ShowMode),
            "/mode" => arg.parse().map(ReplCommand::SetMode),
            "/history" => Ok(ReplCommand::History),
            "/ocr" if arg.is_empty() => Err("Usage: /ocr <path>".to_string()),
            "/ocr" => Ok(ReplCommand::Ocr(PathBuf::from(arg))),
            "/example" => match arg.parse::<QuickAction>() {
                Ok(action @ (QuickAction::ExampleMath | QuickAction::ExampleGeometry)) => {
                    Ok(ReplCommand::Quick(action))
                }
                _ => Err("Usage: /example math|geometry".to_string()),
            },
            "/physics" => Ok(ReplCommand::Quick(QuickAction::Physics)),
            "/chemistry" => Ok(ReplCommand::Quick(QuickAction::Chemistry)),
            "/help" => Ok(ReplCommand::Help),
            "/quit" | "/exit" => Ok(ReplCommand::Quit),
            other => Err(format!("Unknown command {other}. Type /help for the list.")),
        }
    }
}

pub async fn run() -> Result<()> {
    let secrets = SecretStorage::new()?;
    let config = utils::load_config()?;

    let mut rl: ChatEditor = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== ShamanAI ===".bright_magenta().bold());
    println!(
        "{}",
        "Ask anything, or type /help for commands. /quit to exit.".bright_black()
    );
    println!();

    let Some(credential) = stored_or_prompted_credential(&mut rl, &secrets).await? else {
        return Ok(());
    };
    let mut client = InferenceClient::new(config, credential)?;

    loop {
        let readline = rl.readline(&format!("[{}] >> ", client.mode()));

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match ReplCommand::parse(trimmed) {
                    Ok(command) => command,
                    Err(message) => {
                        eprintln!("{}", message.yellow());
                        continue;
                    }
                };

                if command == ReplCommand::Quit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if let Err(err) = execute(&mut client, command).await {
                    eprintln!("{}", utils::handle_failure(&err, &secrets).await.red());

                    if err.requires_new_credential() {
                        match prompt_for_credential(&mut rl, &secrets).await? {
                            Some(credential) => client.set_credential(credential),
                            None => break,
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::debug!(
        requests = client.request_count(),
        exchanges = client.transcript().len(),
        "Chat session ended"
    );
    Ok(())
}

async fn execute(client: &mut InferenceClient, command: ReplCommand) -> Result<(), ShamanError> {
    match command {
        ReplCommand::Prompt(prompt) => {
            if client.classify(&prompt) == TaskHint::Quantitative {
                println!("{}", "(math)".bright_black());
            }
            let reply = client.submit_prompt(&prompt).await?;
            print_reply(&reply);
        }
        ReplCommand::Reset => {
            client.reset_conversation();
            println!("{}", "Conversation cleared".yellow());
        }
        ReplCommand::ShowMode => {
            println!("{}", format!("Mode: {}", describe_mode(client.mode())).yellow());
        }
        ReplCommand::SetMode(mode) => {
            client.set_mode(mode);
            println!("{}", format!("Mode changed: {}", describe_mode(mode)).yellow());
        }
        ReplCommand::History => print_history(client),
        ReplCommand::Ocr(path) => {
            let image = std::fs::read(&path)?;
            match client.recognize_image_text(image).await? {
                OcrOutcome::Recognized(text) => {
                    print_reply(&format!("Recognized text: \"{text}\""));
                }
                OcrOutcome::NotRecognized => println!("{}", "No text recognized".yellow()),
            }
        }
        ReplCommand::Quick(action) => {
            println!("{}", format!("> {}", action.seed_prompt()).green());
            let reply = client.run_preset(action).await?;
            print_reply(&reply);
        }
        ReplCommand::Help => print_help(),
        ReplCommand::Quit => {}
    }

    Ok(())
}

/// Uses the stored token, asking for one when none is stored or it is malformed.
async fn stored_or_prompted_credential(
    rl: &mut ChatEditor,
    secrets: &SecretStorage,
) -> Result<Option<Credential>> {
    match secrets.load().await {
        Ok(Some(credential)) => return Ok(Some(credential)),
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "Stored token is unusable"),
    }
    prompt_for_credential(rl, secrets).await
}

/// Asks for a token until a valid one is entered. `None` when the user gives up.
async fn prompt_for_credential(
    rl: &mut ChatEditor,
    secrets: &SecretStorage,
) -> Result<Option<Credential>> {
    println!(
        "{}",
        "Enter your Hugging Face token (starts with hf_). Create one at https://huggingface.co/settings/tokens"
            .bright_black()
    );

    loop {
        match rl.readline("token: ") {
            Ok(line) => {
                let token = line.trim();
                if token.is_empty() {
                    continue;
                }
                match utils::store_token(secrets, token).await {
                    Ok(credential) => {
                        println!("{}", "Token saved".green());
                        return Ok(Some(credential));
                    }
                    Err(err) => eprintln!("{}", err.to_string().red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }
}

fn describe_mode(mode: GenerationMode) -> &'static str {
    match mode {
        GenerationMode::Smart => "smart (creative)",
        GenerationMode::Fast => "fast (precise)",
    }
}

fn print_reply(reply: &str) {
    for line in reply.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
}

fn print_history(client: &InferenceClient) {
    let transcript = client.transcript();
    if transcript.is_empty() {
        println!("{}", "No messages yet".bright_black());
        return;
    }

    for exchange in transcript {
        println!("{}", exchange.timestamp.bright_black());
        println!("{} {}", "You:".bright_cyan(), exchange.prompt);
        println!("{} {}", "AI:".bright_blue(), exchange.response);
        println!();
    }
}

fn print_help() {
    let lines = [
        ("/reset", "start a new conversation"),
        ("/mode [smart|fast]", "show or change the answer style"),
        ("/history", "show this conversation"),
        ("/ocr <path>", "recognize handwriting in an image"),
        ("/example math|geometry", "solve a worked example"),
        ("/physics", "explain Newton's laws"),
        ("/chemistry", "explain chemical reactions"),
        ("/quit", "leave"),
    ];
    for (command, description) in lines {
        println!("  {:<24} {}", command.bright_cyan(), description.bright_black());
    }
}
