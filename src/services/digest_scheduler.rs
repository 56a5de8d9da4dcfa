//! Daily digest scheduler - sends subscribers news on their topic once a day
//!
//! Checks the local clock every minute and runs once per day during the
//! configured delivery hour.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Timelike};
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use crate::bot::format::{format_articles, ArticleStyle};
use crate::news::CachedNews;

use super::subscriptions::SubscriptionStore;

/// Text sent when a subscriber's topic has no news
pub const NO_NEWS_TODAY: &str = "No relevant news today.";

/// Destination for outgoing chat messages
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Configuration for the digest scheduler
#[derive(Debug, Clone)]
pub struct DigestSchedulerConfig {
    /// Local hour to deliver the digest (0-23, default: 9 AM)
    pub delivery_hour: u32,
    /// Language requested for digest news
    pub default_language: String,
    /// How often the clock is checked
    pub check_interval: Duration,
    /// Whether the scheduler is enabled
    pub enabled: bool,
}

impl Default for DigestSchedulerConfig {
    fn default() -> Self {
        Self {
            delivery_hour: 9, // 9 AM
            default_language: "en".to_string(),
            check_interval: Duration::from_secs(60),
            enabled: true,
        }
    }
}

impl DigestSchedulerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let enabled = std::env::var("DIGEST_ENABLED")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        let delivery_hour = std::env::var("DIGEST_HOUR")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|h| *h < 24)
            .unwrap_or(9);

        Self {
            delivery_hour,
            enabled,
            ..Default::default()
        }
    }
}

/// Result of one digest run
#[derive(Debug, Clone, Default)]
pub struct DigestRunResult {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Daily digest service
pub struct DigestScheduler {
    config: DigestSchedulerConfig,
    news: CachedNews,
    subscriptions: Arc<SubscriptionStore>,
    sink: Arc<dyn MessageSink>,
    is_running: RwLock<bool>,
    last_run: RwLock<Option<NaiveDate>>,
}

impl DigestScheduler {
    pub fn new(
        config: DigestSchedulerConfig,
        news: CachedNews,
        subscriptions: Arc<SubscriptionStore>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            config,
            news,
            subscriptions,
            sink,
            is_running: RwLock::new(false),
            last_run: RwLock::new(None),
        }
    }

    /// Start the background scheduler
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Digest scheduler started (delivery at {:02}:00, check every {}s)",
                self.config.delivery_hour,
                self.config.check_interval.as_secs()
            );

            let mut check_interval = interval(self.config.check_interval);

            loop {
                check_interval.tick().await;

                if !self.should_run(Local::now()).await {
                    continue;
                }

                info!("Sending daily news digest...");
                match self.send_daily_news().await {
                    Ok(result) => info!(
                        "Digest sent: {}/{} delivered, {} failed ({}ms)",
                        result.delivered, result.recipients, result.failed, result.duration_ms
                    ),
                    Err(e) => error!("Digest run failed: {}", e),
                }
            }
        })
    }

    /// True when the digest is due at `now` and has not run today
    pub async fn should_run(&self, now: DateTime<Local>) -> bool {
        if !self.config.enabled || now.hour() != self.config.delivery_hour {
            return false;
        }

        if *self.is_running.read().await {
            debug!("Digest already running, skipping...");
            return false;
        }

        let last_run = *self.last_run.read().await;
        last_run != Some(now.date_naive())
    }

    /// Sends every subscriber the news on their topic.
    ///
    /// A failed send is logged and does not stop the run.
    pub async fn send_daily_news(&self) -> Result<DigestRunResult> {
        let start = std::time::Instant::now();
        *self.is_running.write().await = true;

        let outcome = self.deliver_all().await;

        *self.is_running.write().await = false;

        // A run that failed before delivering stays due for today
        let mut result = outcome?;
        *self.last_run.write().await = Some(Local::now().date_naive());
        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn deliver_all(&self) -> Result<DigestRunResult> {
        let subscriptions = self.subscriptions.all().await?;
        let mut result = DigestRunResult {
            recipients: subscriptions.len(),
            ..Default::default()
        };

        for (chat_id, topic) in subscriptions {
            let Ok(chat_id) = chat_id.parse::<i64>() else {
                warn!("Skipping subscription with invalid chat id '{}'", chat_id);
                result.failed += 1;
                continue;
            };

            let articles = match self.news.news(&topic, &self.config.default_language).await {
                Ok(articles) => articles,
                Err(e) => {
                    warn!("Failed to fetch digest news for '{}': {}", topic, e);
                    Vec::new()
                }
            };

            let text = if articles.is_empty() {
                NO_NEWS_TODAY.to_string()
            } else {
                format_articles(&articles, ArticleStyle::Headline)
            };

            match self.sink.send_message(chat_id, &text).await {
                Ok(()) => result.delivered += 1,
                Err(e) => {
                    warn!("Failed to send news to {}: {}", chat_id, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }

    /// Get scheduler status
    pub async fn status(&self) -> DigestSchedulerStatus {
        DigestSchedulerStatus {
            enabled: self.config.enabled,
            is_running: *self.is_running.read().await,
            last_run: *self.last_run.read().await,
            delivery_hour: self.config.delivery_hour,
        }
    }
}

/// Status information for the digest scheduler
#[derive(Debug, Clone)]
pub struct DigestSchedulerStatus {
    pub enabled: bool,
    pub is_running: bool,
    pub last_run: Option<NaiveDate>,
    pub delivery_hour: u32,
}
