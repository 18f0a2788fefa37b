pub mod markdown;
mod telegram;

use async_trait::async_trait;

use crate::error::Result;

pub use telegram::{BotCommandInfo, TelegramClient};

/// Outgoing side of the chat: delivers one text message to one chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Stand-in used when no bot token is configured.
#[derive(Debug, Default)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        tracing::info!(chat_id, "Notification: {}", text);
        Ok(())
    }
}
