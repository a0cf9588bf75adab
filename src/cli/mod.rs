use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::command::is_quote;

#[derive(Parser)]
#[command(name = "acrobot", version, about = "Shared glossary chat bot")]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "ACROBOT_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Telegram bot.
    Run(ConfigArg),
    /// Run a single command against the database and print the reply.
    Exec(ExecOpts),
    /// Create or migrate the database schema.
    InitDb(ConfigArg),
    /// Check the database and its search index.
    Doctor(ConfigArg),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct ConfigArg {
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(clap::Args)]
pub struct ExecOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    /// Command text as typed after the prefix, e.g. `get HTTP`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}

impl ExecOpts {
    /// Rebuild the command line.
    ///
    /// A single argument is taken as the raw command text. Otherwise words
    /// containing whitespace are re-quoted; a quote character inside a word
    /// has no escape in the command grammar, so such words are rejected.
    pub fn command_text(&self) -> Result<String> {
        if let [raw] = self.text.as_slice() {
            return Ok(raw.clone());
        }

        let mut words = Vec::with_capacity(self.text.len());
        for word in &self.text {
            if word.chars().any(is_quote) {
                bail!(
                    "argument `{word}` contains a quote; pass the whole command as one argument instead"
                );
            }
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                words.push(format!("\"{word}\""));
            } else {
                words.push(word.clone());
            }
        }
        Ok(words.join(" "))
    }
}
