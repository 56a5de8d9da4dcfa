//! Background services and user bookkeeping.
//!
//! This module provides:
//! - **Subscriptions**: one daily-news topic per chat
//! - **Interests**: per-chat search history for recommendations
//! - **Digest scheduler**: daily delivery of subscribed news
//! - **Cache cleanup**: periodic expiry sweep of the response cache
//!
//! # Digest
//!
//! ```ignore
//! use newsbot::services::{DigestScheduler, DigestSchedulerConfig};
//!
//! let scheduler = Arc::new(DigestScheduler::new(
//!     DigestSchedulerConfig::from_env(),
//!     cached_news,
//!     subscriptions,
//!     telegram,
//! ));
//! let _handle = scheduler.start();
//! ```

pub mod cleanup;
pub mod digest_scheduler;
pub mod interests;
pub mod storage;
pub mod subscriptions;

// Re-exports
pub use cleanup::CacheCleanupJob;
pub use digest_scheduler::{
    DigestRunResult, DigestScheduler, DigestSchedulerConfig, DigestSchedulerStatus, MessageSink,
};
pub use interests::InterestStore;
pub use storage::JsonDocument;
pub use subscriptions::SubscriptionStore;
