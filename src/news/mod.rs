//! News retrieval.
//!
//! - **Providers**: [`NewsProvider`] implementations for NewsAPI and tests
//! - **Cached access**: [`CachedNews`] routes every request through the
//!   response cache

pub mod cached;
pub mod client;
pub mod config;

// Re-exports
pub use cached::CachedNews;
pub use client::{format_summary, MockNewsProvider, NewsApiClient, NewsProvider};
pub use config::NewsApiConfig;
