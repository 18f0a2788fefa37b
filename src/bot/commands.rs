use std::sync::OnceLock;

use regex::Regex;

use crate::services::{markdown, BotCommandInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Latest,
    Unknown(String),
}

impl BotCommand {
    pub const KNOWN: [BotCommand; 3] = [BotCommand::Start, BotCommand::Help, BotCommand::Latest];

    pub fn name(&self) -> &str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::Latest => "latest",
            BotCommand::Unknown(name) => name,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BotCommand::Start => "Subscribe to new articles",
            BotCommand::Help => "List available commands",
            BotCommand::Latest => "Get the latest article",
            BotCommand::Unknown(_) => "",
        }
    }
}

fn command_regex() -> &'static Regex {
    static COMMAND_RE: OnceLock<Regex> = OnceLock::new();
    // "/name" or "/name@BotName", optionally followed by arguments
    COMMAND_RE.get_or_init(|| {
        Regex::new(r"^/([A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s|$)").expect("valid command regex")
    })
}

/// `None` for plain text that is not a command.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let name = command_regex()
        .captures(text.trim())?
        .get(1)?
        .as_str()
        .to_lowercase();

    Some(match name.as_str() {
        "start" => BotCommand::Start,
        "help" => BotCommand::Help,
        "latest" => BotCommand::Latest,
        _ => BotCommand::Unknown(name),
    })
}

/// Command list registered with Telegram for the client-side menu.
pub fn command_list() -> Vec<BotCommandInfo> {
    BotCommand::KNOWN
        .iter()
        .map(|command| BotCommandInfo {
            command: command.name().to_string(),
            description: command.description().to_string(),
        })
        .collect()
}

/// Borderless, left-aligned table of the known commands in a MarkdownV2 pre block.
pub fn help_text() -> String {
    let header = ["№".to_string(), "COMMAND".to_string(), "DESCRIPTION".to_string()];
    let rows: Vec<[String; 3]> = BotCommand::KNOWN
        .iter()
        .enumerate()
        .map(|(index, command)| {
            [
                (index + 1).to_string(),
                command.name().to_string(),
                command.description().to_string(),
            ]
        })
        .collect();

    let mut widths = [0usize; 3];
    for row in std::iter::once(&header).chain(rows.iter()) {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for row in std::iter::once(&header).chain(rows.iter()) {
        let line = row
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| {
                let pad = width - cell.chars().count();
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }

    format!("```\n{}\n```", markdown::escape_code(&lines.join("\n")))
}
