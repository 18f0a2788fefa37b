//! Chat command surface: `/start`, `/help` and `/latest`.

mod commands;
mod handler;

use std::time::Duration;

use crate::services::{Messenger, TelegramClient};

use commands::command_list;

pub use handler::BotHandler;

/// Server-side wait of one `getUpdates` call.
const LONG_POLL: Duration = Duration::from_secs(30);

/// Long-polls Telegram for messages and answers them. Runs until dropped.
pub async fn run(telegram: &TelegramClient, handler: &BotHandler<'_>, backoff: Duration) {
    if let Err(e) = telegram.set_my_commands(&command_list()).await {
        tracing::warn!("Could not register bot commands: {}", e);
    }

    tracing::info!("Listening for bot commands");
    let mut offset = 0;

    loop {
        let updates = match telegram.get_updates(offset, LONG_POLL).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed, retrying in {:?}: {}", backoff, e);
                tokio::time::sleep(backoff).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                continue;
            };

            let chat_id = message.chat.id;
            if let Some(reply) = handler.handle(chat_id, &text).await {
                if let Err(e) = telegram.send(chat_id, &reply).await {
                    tracing::warn!(chat_id, "Could not answer command: {}", e);
                }
            }
        }
    }
}
