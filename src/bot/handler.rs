//! Command dispatch: turns a chat message into a reply.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::NewsArticle;
use crate::news::CachedNews;
use crate::services::{InterestStore, SubscriptionStore};

use super::commands::{parse_topic_language, Command, DEFAULT_LANGUAGE};
use super::format::{self, ArticleStyle};

/// Handles bot commands for all chats
pub struct BotHandler {
    news: CachedNews,
    subscriptions: Arc<SubscriptionStore>,
    interests: Arc<InterestStore>,
}

impl BotHandler {
    pub fn new(
        news: CachedNews,
        subscriptions: Arc<SubscriptionStore>,
        interests: Arc<InterestStore>,
    ) -> Self {
        Self {
            news,
            subscriptions,
            interests,
        }
    }

    /// Reply for a message, or None when it is not a command
    pub async fn handle(&self, chat_id: i64, text: &str) -> Option<String> {
        let command = Command::parse(text)?;
        debug!("Chat {} -> {:?}", chat_id, command);

        let reply = match command {
            Command::Start => format::welcome_message(),
            Command::Help => format::help_message(),
            Command::News(arg) => self.news(chat_id, arg).await,
            Command::Trending => self.trending().await,
            Command::Summary(arg) => self.summary(arg).await,
            Command::Subscribe(arg) => self.subscribe(chat_id, arg).await,
            Command::Unsubscribe => self.unsubscribe(chat_id).await,
            Command::Subscriptions => self.view_subscription(chat_id).await,
            Command::Recommend => self.recommend(chat_id).await,
            Command::CacheStats => self.cache_stats().await,
            Command::ClearCache => self.clear_cache().await,
        };
        Some(reply)
    }

    async fn news(&self, chat_id: i64, arg: Option<String>) -> String {
        let Some(arg) = arg else {
            return format::NEWS_USAGE.to_string();
        };
        let (topic, language) = parse_topic_language(&arg);

        if let Err(e) = self.interests.record(chat_id, &topic).await {
            warn!("Failed to record interest for chat {}: {}", chat_id, e);
        }

        let articles = self.fetch_news(&topic, &language).await;
        if articles.is_empty() {
            format::no_news_message(&topic, &language)
        } else {
            format::format_articles(&articles, ArticleStyle::Headline)
        }
    }

    async fn trending(&self) -> String {
        let articles = match self.news.trending().await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("Trending fetch failed: {}", e);
                Vec::new()
            }
        };

        if articles.is_empty() {
            format::NO_TRENDING.to_string()
        } else {
            format::format_articles(&articles, ArticleStyle::Trending)
        }
    }

    async fn summary(&self, arg: Option<String>) -> String {
        let Some(topic) = arg else {
            return format::SUMMARY_USAGE.to_string();
        };

        let summaries = match self.news.summary(&topic).await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!("Summary fetch for '{}' failed: {}", topic, e);
                Vec::new()
            }
        };

        if summaries.is_empty() {
            format::NO_SUMMARIES.to_string()
        } else {
            format::format_summaries(&summaries)
        }
    }

    async fn subscribe(&self, chat_id: i64, arg: Option<String>) -> String {
        let Some(topic) = arg else {
            return format::SUBSCRIBE_USAGE.to_string();
        };

        match self.subscriptions.subscribe(chat_id, &topic).await {
            Ok(()) => format::subscribed_message(&topic),
            Err(e) => {
                warn!("Failed to save subscription for chat {}: {}", chat_id, e);
                "⚠️ Could not save your subscription, please try again later.".to_string()
            }
        }
    }

    async fn unsubscribe(&self, chat_id: i64) -> String {
        match self.subscriptions.unsubscribe(chat_id).await {
            Ok(true) => format::UNSUBSCRIBED.to_string(),
            Ok(false) => format::NOT_SUBSCRIBED.to_string(),
            Err(e) => {
                warn!("Failed to remove subscription for chat {}: {}", chat_id, e);
                "⚠️ Could not update your subscription, please try again later.".to_string()
            }
        }
    }

    async fn view_subscription(&self, chat_id: i64) -> String {
        match self.subscriptions.get(chat_id).await {
            Ok(Some(topic)) => format::subscription_message(&topic),
            Ok(None) => format::NOT_SUBSCRIBED.to_string(),
            Err(e) => {
                warn!("Failed to read subscriptions: {}", e);
                format::NOT_SUBSCRIBED.to_string()
            }
        }
    }

    async fn recommend(&self, chat_id: i64) -> String {
        let topic = match self.interests.latest(chat_id).await {
            Ok(Some(topic)) => topic,
            Ok(None) => return format::NO_INTERESTS.to_string(),
            Err(e) => {
                warn!("Failed to read interests: {}", e);
                return format::NO_INTERESTS.to_string();
            }
        };

        let articles = self.fetch_news(&topic, DEFAULT_LANGUAGE).await;
        if articles.is_empty() {
            format::NO_RECOMMENDATIONS.to_string()
        } else {
            format::recommendation_message(&topic, &articles)
        }
    }

    async fn cache_stats(&self) -> String {
        let stats = self.news.cache().stats().await;
        format::cache_stats_message(&stats)
    }

    async fn clear_cache(&self) -> String {
        match self.news.cache().clear_expired().await {
            Ok(removed) => format::cache_cleared_message(removed),
            Err(e) => {
                warn!("Cache maintenance failed: {}", e);
                "⚠️ Cache maintenance failed.".to_string()
            }
        }
    }

    /// Fetch failures are logged and treated as no news
    async fn fetch_news(&self, topic: &str, language: &str) -> Vec<NewsArticle> {
        match self.news.news(topic, language).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("News fetch for '{}' ({}) failed: {}", topic, language, e);
                Vec::new()
            }
        }
    }
}
