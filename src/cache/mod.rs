//! Response cache for upstream news requests.
//!
//! This module provides:
//! - Deterministic cache keys per (kind, topic, language)
//! - TTL validity and an expiry sweep
//! - A "keep newest N" size bound
//! - A durable keyed store, loaded and saved wholesale
//! - [`CacheManager`], the get-or-fetch entry point
//!
//! # Example
//!
//! ```rust,ignore
//! use newsbot::cache::{CacheConfig, CacheManager, FetchOutcome, RequestKind};
//!
//! let manager = CacheManager::with_file_store(CacheConfig::from_env());
//! let payload = manager
//!     .get_or_fetch(RequestKind::News, "AI", "en", |topic, lang| async move {
//!         FetchOutcome::from_result(provider.fetch_news(&topic, &lang).await)
//!     })
//!     .await?;
//! ```

pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod eviction;
pub mod freshness;
pub mod key;
pub mod manager;
pub mod store;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheMetrics, CacheStats};
pub use entry::{CacheEntry, CachePayload, CacheTable, NewsArticle, RequestKind};
pub use error::{CacheError, CacheResult};
pub use eviction::{enforce_capacity, evict, sweep_expired, EvictionReport};
pub use freshness::is_valid;
pub use key::derive_key;
pub use manager::{CacheManager, FetchOutcome};
pub use store::{CacheStore, JsonFileStore, MemoryStore};
