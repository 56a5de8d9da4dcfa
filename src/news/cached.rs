//! Cached accessors over a news provider.

use std::sync::Arc;

use crate::cache::{CacheManager, CacheResult, FetchOutcome, NewsArticle, RequestKind};

use super::client::NewsProvider;

/// Topic component of the trending cache key
pub const TRENDING_TOPIC: &str = "top-headlines";

/// Language of summary requests
pub const SUMMARY_LANGUAGE: &str = "en";

/// News provider fronted by the response cache
#[derive(Clone)]
pub struct CachedNews {
    cache: Arc<CacheManager>,
    provider: Arc<dyn NewsProvider>,
    country: String,
}

impl CachedNews {
    pub fn new(cache: Arc<CacheManager>, provider: Arc<dyn NewsProvider>) -> Self {
        Self {
            cache,
            provider,
            country: "us".to_string(),
        }
    }

    /// Sets the headline country used in the trending cache key
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = country.to_lowercase();
        self
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Articles for a topic and language
    pub async fn news(&self, topic: &str, language: &str) -> CacheResult<Vec<NewsArticle>> {
        let provider = self.provider.clone();
        let payload = self
            .cache
            .get_or_fetch(RequestKind::News, topic, language, |topic, language| async move {
                FetchOutcome::from_result(provider.fetch_news(&topic, &language).await)
            })
            .await?;
        Ok(payload.into_articles())
    }

    /// Current top headlines
    pub async fn trending(&self) -> CacheResult<Vec<NewsArticle>> {
        let provider = self.provider.clone();
        let payload = self
            .cache
            .get_or_fetch(RequestKind::Trending, TRENDING_TOPIC, &self.country, |_, _| async move {
                FetchOutcome::from_result(provider.fetch_trending().await)
            })
            .await?;
        Ok(payload.into_articles())
    }

    /// Preformatted summaries for a topic
    pub async fn summary(&self, topic: &str) -> CacheResult<Vec<String>> {
        let provider = self.provider.clone();
        let payload = self
            .cache
            .get_or_fetch(RequestKind::Summary, topic, SUMMARY_LANGUAGE, |topic, _| async move {
                FetchOutcome::from_result(provider.fetch_summaries(&topic).await)
            })
            .await?;
        Ok(payload.into_summaries())
    }
}
