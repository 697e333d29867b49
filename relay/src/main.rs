//! Prompt-routing assistant CLI.
//!
//! Single-shot prompts go to the chat service by default; `--agent` hands them
//! to the configured autonomous agent instead, and `--chat` starts an
//! interactive loop where `agent:`-prefixed lines reach the agent.

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use relay::exit_codes;
use relay::io::chat::OpenAiChat;
use relay::io::config::{RelayConfig, default_config_path, load_config};
use relay::io::delegate::ProcessDelegate;
use relay::{logging, session};

#[derive(Parser)]
#[command(
    name = "relay",
    version,
    about = "Route prompts to a chat model or hand them to an autonomous agent"
)]
struct Cli {
    /// Start interactive chat mode.
    #[arg(short, long)]
    chat: bool,

    /// Hand the prompt to the configured agent instead of the chat model.
    #[arg(short, long)]
    agent: bool,

    /// Emit delegation diagnostics (command line, stdin payload, raw streams).
    #[arg(short, long)]
    verbose: bool,

    /// Config file path (default: ~/.config/relay/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Prompt text; combined with piped stdin when present.
    #[arg(value_name = "PROMPT")]
    prompt: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_cli_config(cli.config.as_deref())?;
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();

    if cli.chat {
        let backend = OpenAiChat::new(config.chat.clone(), api_key)?;
        let delegate = ProcessDelegate::new(config.delegate.clone());
        let stdin = std::io::stdin();
        return session::run_repl(
            backend,
            &delegate,
            stdin.lock(),
            std::io::stdout(),
            cli.verbose,
        );
    }

    let piped = read_piped_stdin()?;
    let prompt = session::combined_prompt(piped.as_deref(), &cli.prompt)
        .ok_or_else(|| anyhow!("no prompt provided (see --help)"))?;

    let text = if cli.agent {
        let delegate = ProcessDelegate::new(config.delegate.clone());
        session::delegate_once(&delegate, &prompt, cli.verbose)
    } else {
        let backend = OpenAiChat::new(config.chat.clone(), api_key)?;
        session::chat_once(backend, &prompt)?
    };

    if !text.is_empty() {
        println!("{text}");
    }
    Ok(())
}

fn load_cli_config(path: Option<&Path>) -> Result<RelayConfig> {
    match path {
        Some(path) => load_config(path),
        None => match default_config_path() {
            Some(path) => load_config(&path),
            None => Ok(RelayConfig::default()),
        },
    }
}

/// Read piped stdin when input is not a terminal.
fn read_piped_stdin() -> Result<Option<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buf = String::new();
    stdin
        .lock()
        .read_to_string(&mut buf)
        .context("read piped stdin")?;
    Ok(Some(buf))
}
