use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::Messenger;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SetMyCommandsRequest<'a> {
    commands: &'a [BotCommandInfo],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommandInfo {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", TELEGRAM_API_URL, token),
            request_timeout,
        })
    }

    /// Long-polls for new updates. `offset` is the id after the last handled update.
    pub async fn get_updates(&self, offset: i64, long_poll: Duration) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: long_poll.as_secs(),
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &request, long_poll + self.request_timeout)
            .await
    }

    pub async fn set_my_commands(&self, commands: &[BotCommandInfo]) -> Result<()> {
        let _: bool = self
            .call(
                "setMyCommands",
                &SetMyCommandsRequest { commands },
                self.request_timeout,
            )
            .await?;
        Ok(())
    }

    async fn call<P, R>(&self, method: &str, payload: &P, timeout: Duration) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        // reqwest errors carry the URL, and the URL carries the bot token
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        parse_response(method, status.as_u16(), &body)
    }
}

fn parse_response<R: DeserializeOwned>(method: &str, status: u16, body: &str) -> Result<R> {
    let response: ApiResponse<R> = serde_json::from_str(body).map_err(|e| {
        AppError::Telegram(format!("{} returned HTTP {} with unreadable body: {}", method, status, e))
    })?;

    if !response.ok {
        return Err(AppError::Telegram(format!(
            "{} failed with HTTP {}: {}",
            method,
            status,
            response.description.unwrap_or_default()
        )));
    }

    response
        .result
        .ok_or_else(|| AppError::Telegram(format!("{} returned no result", method)))
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "MarkdownV2",
        };
        let _: serde_json::Value = self
            .call("sendMessage", &request, self.request_timeout)
            .await?;
        Ok(())
    }
}
