use crate::api::ArticleSource;
use crate::db::Repository;
use crate::models::{Latest, Source};
use crate::registry::SubscriberRegistry;
use crate::services::markdown;

use super::commands::{help_text, parse_command, BotCommand};

pub const GREETING: &str = "Hello.\nI'm a bot that will send you new interesting articles";
pub const NO_ARTICLES: &str = "There are no articles yet";
const REGISTRATION_FAILED: &str = "Could not subscribe you right now, please send /start again later";

/// Answers chat commands. Returns the reply as MarkdownV2, if any.
pub struct BotHandler<'a> {
    registry: SubscriberRegistry<'a>,
    articles: &'a dyn ArticleSource,
}

impl<'a> BotHandler<'a> {
    pub fn new(repository: &'a Repository, articles: &'a dyn ArticleSource) -> Self {
        Self {
            registry: SubscriberRegistry::new(repository),
            articles,
        }
    }

    pub async fn handle(&self, chat_id: i64, text: &str) -> Option<String> {
        let command = parse_command(text)?;
        tracing::debug!(chat_id, "Command /{}", command.name());

        let reply = match command {
            BotCommand::Start => match self.registry.register(chat_id).await {
                Ok(_) => markdown::escape(GREETING),
                Err(e) => {
                    tracing::error!(chat_id, "Could not register subscriber: {}", e);
                    markdown::escape(REGISTRATION_FAILED)
                }
            },
            BotCommand::Help => help_text(),
            BotCommand::Latest => match self.articles.fetch_latest(Source::Native).await {
                Ok(Latest::Article(article)) => article.to_message(),
                Ok(Latest::Empty) => markdown::escape(NO_ARTICLES),
                Err(e) => {
                    tracing::warn!("Could not fetch latest article: {}", e);
                    markdown::escape(NO_ARTICLES)
                }
            },
            BotCommand::Unknown(name) => markdown::escape(&format!(
                "Unknown command /{}. Send /help for the list of commands",
                name
            )),
        };
        Some(reply)
    }
}
