//! Command-line interface of the notifier.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(short, long, env = "BLOG_NOTIFIER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reconcile watermarks, then poll and answer bot commands until Ctrl-C (default)
    Run,
    /// Reconcile watermarks, run a single polling tick and exit
    Tick,
    /// Reconcile watermarks against the API and exit
    Reconcile,
    /// Register a chat as subscriber
    Subscribe {
        /// Telegram chat id
        #[arg(allow_negative_numbers = true)]
        chat_id: i64,
    },
    /// Show watermarks and the number of subscribers
    Status,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
