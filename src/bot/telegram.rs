//! Telegram Bot API client and long-polling loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::config::BotConfig;
use super::handler::BotHandler;
use crate::services::MessageSink;

/// Maximum text length of one Telegram message
pub const MAX_MESSAGE_LEN: usize = 4096;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Bot API envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Chat id and text of a text message
    pub fn text_message(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref()?;
        Some((message.chat.id, message.text.as_deref()?))
    }
}

/// Splits a reply into chunks Telegram accepts, preferring line breaks
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if current.chars().count() + line.chars().count() > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if line.chars().count() > max_len {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_len) {
                chunks.push(piece.iter().collect());
            }
        } else {
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Minimal Bot API client
pub struct TelegramClient {
    config: BotConfig,
    client: Client,
}

impl TelegramClient {
    pub fn new(config: BotConfig) -> Result<Self> {
        // Must outlive the long-poll timeout
        let client = Client::builder()
            .timeout(config.poll_timeout + Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.config.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Telegram {} request failed: {}", method, e.without_url()))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Telegram {} response ({})", method, status))?;

        if !envelope.ok {
            bail!(
                "Telegram {} failed: {}",
                method,
                envelope.description.unwrap_or_else(|| status.to_string())
            );
        }

        envelope
            .result
            .ok_or_else(|| anyhow!("Telegram {} returned no result", method))
    }

    /// Long-polls for updates after `offset`
    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", body).await
    }

    /// Sends Markdown text, split over several messages when too long
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let body = json!({
                "chat_id": chat_id,
                "text": chunk,
                "parse_mode": "Markdown",
                "disable_web_page_preview": true,
            });
            let _: serde_json::Value = self.call("sendMessage", body).await?;
        }
        Ok(())
    }

    /// Registers the command menu
    pub async fn set_my_commands(&self, commands: &[(&str, &str)]) -> Result<()> {
        let commands: Vec<_> = commands
            .iter()
            .map(|(command, description)| json!({ "command": command, "description": description }))
            .collect();
        let count = commands.len();
        let _: bool = self.call("setMyCommands", json!({ "commands": commands })).await?;
        info!("Registered {} bot commands", count);
        Ok(())
    }

    /// Polls forever, answering each text message on its own task
    pub async fn run_polling(self: Arc<Self>, handler: Arc<BotHandler>) -> Result<()> {
        info!("Polling for updates (timeout {}s)", self.config.poll_timeout.as_secs());
        let mut offset = None;

        loop {
            let updates = match self.get_updates(offset, self.config.poll_timeout).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("getUpdates failed: {}; retrying in {}s", e, RETRY_DELAY.as_secs());
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let Some((chat_id, text)) = update.text_message() else {
                    continue;
                };
                debug!("Update {} from chat {}", update.update_id, chat_id);

                let text = text.to_string();
                let client = self.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Some(reply) = handler.handle(chat_id, &text).await {
                        if let Err(e) = client.send_message(chat_id, &reply).await {
                            warn!("Failed to reply to chat {}: {}", chat_id, e);
                        }
                    }
                });
            }
        }
    }
}

#[async_trait]
impl MessageSink for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        TelegramClient::send_message(self, chat_id, text).await
    }
}
