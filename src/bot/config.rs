//! Telegram bot configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the Telegram front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot token issued by BotFather
    pub token: String,

    /// Bot API base URL
    pub api_url: String,

    /// Long-poll timeout passed to getUpdates
    pub poll_timeout: Duration,

    /// Subscription file
    pub subscriptions_path: PathBuf,

    /// Search history file
    pub interests_path: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout: Duration::from_secs(30),
            subscriptions_path: PathBuf::from("subscriptions.json"),
            interests_path: PathBuf::from("interests.json"),
        }
    }
}

impl BotConfig {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            ..Default::default()
        }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Loads configuration from environment variables; `BOT_TOKEN` is required.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("BOT_TOKEN").context("BOT_TOKEN is not set")?;
        let mut config = Self::new(&token);

        if let Ok(val) = std::env::var("TELEGRAM_API_URL") {
            config = config.with_api_url(&val);
        }

        if let Ok(val) = std::env::var("BOT_POLL_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.poll_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(val) = std::env::var("SUBSCRIPTIONS_FILE") {
            config.subscriptions_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("INTERESTS_FILE") {
            config.interests_path = PathBuf::from(val);
        }

        Ok(config)
    }

    /// URL of a Bot API method
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}
