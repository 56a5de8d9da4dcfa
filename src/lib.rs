//! Newsbot: a Telegram news bot backed by a persistent response cache.
//!
//! The library exposes the cache, the news providers, the user stores and
//! background jobs, and the bot command surface.

pub mod bot;
pub mod cache;
pub mod news;
pub mod services;

// Cache exports
pub use cache::{
    CacheConfig, CacheError, CacheManager, CachePayload, CacheStats, CacheStore, FetchOutcome,
    JsonFileStore, MemoryStore, NewsArticle, RequestKind,
};

// News exports
pub use news::{CachedNews, MockNewsProvider, NewsApiClient, NewsApiConfig, NewsProvider};

// Bot exports
pub use bot::{BotConfig, BotHandler, TelegramClient};
