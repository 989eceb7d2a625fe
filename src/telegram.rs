//! # Telegram Transport
//!
//! Minimal Bot API client: long-polls `getUpdates`, hands each message to the
//! [`RequestHandler`] in its own task, and sends the plain-text replies.
//!
//! ## Routing
//!
//! | Message | Action |
//! |---------|--------|
//! | `/start` | greeting or denial reply |
//! | anything else | print pipeline; reply only on denial |

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ScrewieError;
use crate::handler::RequestHandler;
use crate::message::Message;

const API_BASE: &str = "https://api.telegram.org";

/// Long-poll timeout passed to `getUpdates` (seconds).
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, ScrewieError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(ScrewieError::Transport(format!(
                "{} failed: {}",
                method,
                self.description.as_deref().unwrap_or("no description")
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    /// Unix time in seconds
    pub date: i64,
    pub chat: TgChat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl TgMessage {
    /// Convert to the transport-neutral [`Message`].
    ///
    /// Returns `None` for messages without a sender (channel posts) or with an
    /// out-of-range date.
    pub fn into_message(self) -> Option<Message> {
        let from = self.from?;
        let timestamp = DateTime::<Utc>::from_timestamp(self.date, 0)?;
        Some(Message {
            sender_id: from.id,
            chat_id: self.chat.id,
            username: from.username,
            first_name: from.first_name,
            last_name: from.last_name,
            timestamp,
            text: self.text,
        })
    }
}

/// Bot API client.
#[derive(Clone)]
pub struct TelegramBot {
    bot_token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot").finish_non_exhaustive()
    }
}

impl TelegramBot {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", API_BASE, self.bot_token)
    }

    /// Check the token and return the bot's username.
    pub async fn get_me(&self) -> Result<String, ScrewieError> {
        let resp: ApiResponse<TgUser> = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)?;
        let me = resp.into_result("getMe")?;
        Ok(me.username.unwrap_or_else(|| me.id.to_string()))
    }

    /// Fetch updates with `update_id >= offset`, waiting up to the poll timeout.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ScrewieError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });

        let resp: ApiResponse<Vec<Update>> = self
            .client
            .post(self.api_url("getUpdates"))
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)?;

        resp.into_result("getUpdates")
    }

    /// Send a plain-text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ScrewieError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ScrewieError::Transport(format!(
                "sendMessage failed ({}): {}",
                status, err
            )));
        }
        Ok(())
    }

    /// Poll forever, spawning one task per received message.
    pub async fn run(self: Arc<Self>, handler: Arc<RequestHandler>) {
        let mut offset: i64 = 0;
        tracing::info!("Telegram bot started and polling for messages.");

        loop {
            let updates = match self.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = next_offset(offset, update.update_id);

                let Some(message) = update.message.and_then(TgMessage::into_message) else {
                    continue;
                };

                let bot = Arc::clone(&self);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move { bot.process(handler, message).await });
            }
        }
    }

    async fn process(&self, handler: Arc<RequestHandler>, message: Message) {
        let chat_id = message.chat_id;

        let reply = if message.is_start_command() {
            Some(handler.handle_start(&message))
        } else {
            let outcome =
                tokio::task::spawn_blocking(move || handler.handle_message(&message)).await;
            match outcome {
                Ok(outcome) => outcome.reply(),
                Err(e) => {
                    tracing::error!("Message task failed: {}", e);
                    None
                }
            }
        };

        if let Some(text) = reply {
            if let Err(e) = self.send_message(chat_id, text).await {
                tracing::warn!("Failed to reply to chat {}: {}", chat_id, e);
            }
        }
    }
}

fn next_offset(current: i64, update_id: i64) -> i64 {
    current.max(update_id + 1)
}

fn transport_error(e: reqwest::Error) -> ScrewieError {
    // Request errors embed the URL, which contains the bot token.
    ScrewieError::Transport(e.without_url().to_string())
}
