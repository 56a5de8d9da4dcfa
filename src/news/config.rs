//! NewsAPI client configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the NewsAPI client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsApiConfig {
    /// API key sent with every request.
    pub api_key: String,

    /// Base URL of the v2 API.
    pub base_url: String,

    /// Articles per topic or trending request.
    pub page_size: usize,

    /// Articles per summary request.
    pub summary_page_size: usize,

    /// Country for top headlines.
    pub country: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://newsapi.org/v2".to_string(),
            page_size: 5,
            summary_page_size: 3,
            country: "us".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl NewsApiConfig {
    /// Creates a new configuration with the given key.
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            ..Default::default()
        }
    }

    /// Builder: set base URL.
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Builder: set page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Builder: set headline country.
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = country.to_lowercase();
        self
    }

    /// Creates configuration from environment variables.
    ///
    /// `NEWS_API_KEY` is required.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("NEWS_API_KEY").context("NEWS_API_KEY is not set")?;
        let mut config = Self::new(&api_key);

        if let Ok(val) = std::env::var("NEWS_API_URL") {
            config.base_url = val;
        }

        if let Ok(val) = std::env::var("NEWS_COUNTRY") {
            config.country = val.to_lowercase();
        }

        if let Ok(val) = std::env::var("NEWS_PAGE_SIZE") {
            if let Ok(size) = val.parse::<usize>() {
                config.page_size = size.max(1);
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_api_config_default() {
        let config = NewsApiConfig::default();
        assert_eq!(config.base_url, "https://newsapi.org/v2");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.summary_page_size, 3);
        assert_eq!(config.country, "us");
    }

    #[test]
    fn test_news_api_config_builder() {
        let config = NewsApiConfig::new("key")
            .with_base_url("http://localhost:9000".to_string())
            .with_page_size(0)
            .with_country("GB");

        assert_eq!(config.api_key, "key");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.page_size, 1);
        assert_eq!(config.country, "gb");
    }
}
