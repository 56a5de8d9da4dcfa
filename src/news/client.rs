//! Upstream news retrieval.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::config::NewsApiConfig;
use crate::cache::NewsArticle;

/// Placeholder used when an article has no description.
pub const NO_SUMMARY: &str = "No summary available.";

/// Renders one summary line the way the bot displays it.
pub fn format_summary(title: &str, description: Option<&str>, url: &str) -> String {
    let description = description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(NO_SUMMARY);
    format!("📰 *{}*\n_{}_\n🔗 {}", title, description, url)
}

/// Trait for news sources.
///
/// An empty list means "nothing found"; transport problems are errors.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Articles matching a topic in a language.
    async fn fetch_news(&self, topic: &str, language: &str) -> Result<Vec<NewsArticle>>;

    /// Current top headlines.
    async fn fetch_trending(&self) -> Result<Vec<NewsArticle>>;

    /// Preformatted summaries for a topic.
    async fn fetch_summaries(&self, topic: &str) -> Result<Vec<String>>;

    /// Gets the provider name.
    fn provider_name(&self) -> &str;
}

// =============================================================================
// NewsAPI Provider
// =============================================================================

/// NewsAPI response structure.
#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    #[serde(default)]
    message: Option<String>,
}

/// Single article from NewsAPI.
#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl NewsApiArticle {
    fn into_article(self) -> Option<NewsArticle> {
        Some(NewsArticle::new(self.title?, self.url?))
    }

    fn into_summary(self) -> Option<String> {
        let title = self.title?;
        let url = self.url?;
        Some(format_summary(&title, self.description.as_deref(), &url))
    }
}

/// Client for newsapi.org.
pub struct NewsApiClient {
    config: NewsApiConfig,
    client: Client,
}

impl NewsApiClient {
    /// Creates a new NewsAPI client.
    pub fn new(config: NewsApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("newsbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Runs a query and returns the articles, or none when the API reports
    /// a non-ok status.
    async fn query(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<NewsApiArticle>> {
        let url = self.endpoint(path);
        debug!("NewsAPI request: {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.config.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| anyhow!("NewsAPI request failed: {}", e))?;

        let http_status = response.status();
        let body: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse NewsAPI response ({}): {}", http_status, e))?;

        if body.status != "ok" {
            warn!(
                "NewsAPI returned status '{}': {}",
                body.status,
                body.message.unwrap_or_default()
            );
            return Ok(Vec::new());
        }

        Ok(body.articles)
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn fetch_news(&self, topic: &str, language: &str) -> Result<Vec<NewsArticle>> {
        let params = [
            ("q", format!("\"{}\"", topic)),
            ("sortBy", "relevancy".to_string()),
            ("language", language.to_string()),
            ("pageSize", self.config.page_size.to_string()),
        ];
        let articles = self.query("everything", &params).await?;
        Ok(articles.into_iter().filter_map(NewsApiArticle::into_article).collect())
    }

    async fn fetch_trending(&self) -> Result<Vec<NewsArticle>> {
        let params = [
            ("country", self.config.country.clone()),
            ("pageSize", self.config.page_size.to_string()),
        ];
        let articles = self.query("top-headlines", &params).await?;
        Ok(articles.into_iter().filter_map(NewsApiArticle::into_article).collect())
    }

    async fn fetch_summaries(&self, topic: &str) -> Result<Vec<String>> {
        let params = [
            ("q", format!("\"{}\"", topic)),
            ("qInTitle", topic.to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("language", "en".to_string()),
            ("pageSize", self.config.summary_page_size.to_string()),
        ];
        let articles = self.query("everything", &params).await?;
        Ok(articles.into_iter().filter_map(NewsApiArticle::into_summary).collect())
    }

    fn provider_name(&self) -> &str {
        "newsapi"
    }
}

// =============================================================================
// Mock Provider
// =============================================================================

/// Mock news provider for testing.
#[derive(Debug, Default)]
pub struct MockNewsProvider {
    should_fail: AtomicBool,
    empty: AtomicBool,
    news_calls: AtomicUsize,
    trending_calls: AtomicUsize,
    summary_calls: AtomicUsize,
}

impl MockNewsProvider {
    /// Creates a new mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock provider that always fails.
    pub fn failing() -> Self {
        let provider = Self::default();
        provider.set_should_fail(true);
        provider
    }

    /// Sets whether the provider should fail.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Sets whether the provider finds nothing.
    pub fn set_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }

    pub fn news_calls(&self) -> usize {
        self.news_calls.load(Ordering::SeqCst)
    }

    pub fn trending_calls(&self) -> usize {
        self.trending_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<bool> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(anyhow!("Mock news provider configured to fail"));
        }
        Ok(!self.empty.load(Ordering::SeqCst))
    }

    fn generate_mock_articles(prefix: &str, count: usize) -> Vec<NewsArticle> {
        (1..=count)
            .map(|i| {
                NewsArticle::new(
                    format!("{} story {}", prefix, i),
                    format!("https://news.example.com/{}/{}", prefix.replace(' ', "-"), i),
                )
            })
            .collect()
    }
}

#[async_trait]
impl NewsProvider for MockNewsProvider {
    async fn fetch_news(&self, topic: &str, language: &str) -> Result<Vec<NewsArticle>> {
        self.news_calls.fetch_add(1, Ordering::SeqCst);
        if !self.check()? {
            return Ok(Vec::new());
        }
        Ok(Self::generate_mock_articles(&format!("{} {}", topic, language), 3))
    }

    async fn fetch_trending(&self) -> Result<Vec<NewsArticle>> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        if !self.check()? {
            return Ok(Vec::new());
        }
        Ok(Self::generate_mock_articles("trending", 5))
    }

    async fn fetch_summaries(&self, topic: &str) -> Result<Vec<String>> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if !self.check()? {
            return Ok(Vec::new());
        }
        Ok(Self::generate_mock_articles(topic, 2)
            .into_iter()
            .map(|a| format_summary(&a.title, None, &a.url))
            .collect())
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
