//! Configuration and metrics for the response cache.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::entry::RequestKind;

/// Default time-to-live for cached responses
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Default maximum number of cached responses
pub const DEFAULT_CAPACITY: usize = 100;

/// Default location of the cache file
pub const DEFAULT_CACHE_PATH: &str = "news_cache.json";

/// Configuration for the response cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries kept after any cache operation
    pub capacity: usize,

    /// Age after which an entry is stale
    pub ttl: Duration,

    /// File backing the cache table
    pub path: PathBuf,

    /// Interval of the background expiry sweep (None = disabled)
    pub cleanup_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            path: PathBuf::from(DEFAULT_CACHE_PATH),
            cleanup_interval: Some(Duration::from_secs(600)), // 10 minutes
        }
    }
}

impl CacheConfig {
    /// Creates a new cache configuration with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Sets the TTL for cache entries
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = duration;
        self
    }

    /// Sets the backing file
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Disables the background cleanup job
    pub fn no_cleanup(mut self) -> Self {
        self.cleanup_interval = None;
        self
    }

    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        let capacity = std::env::var("CACHE_MAX_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CAPACITY);

        let ttl_secs = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECS);

        let path = std::env::var("CACHE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_PATH));

        let cleanup_minutes: u64 = std::env::var("CACHE_CLEANUP_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let cleanup_interval = if cleanup_minutes > 0 {
            Some(Duration::from_secs(cleanup_minutes * 60))
        } else {
            None
        };

        Self {
            capacity,
            ttl: Duration::from_secs(ttl_secs),
            path,
            cleanup_interval,
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Number of cache hits
    pub hits: u64,

    /// Number of cache misses
    pub misses: u64,

    /// Number of entries dropped by the size bound
    pub evictions: u64,

    /// Number of entries removed by expiry sweeps
    pub expirations: u64,

    /// Number of fetches that were not written back (empty or failed)
    pub skipped_writes: u64,
}

impl CacheMetrics {
    /// Calculates hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Returns total requests (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Snapshot reported by `CacheManager::stats`
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Entries remaining after the expiry sweep
    pub total_entries: usize,

    /// Configured maximum number of entries
    pub capacity: usize,

    /// Configured time-to-live
    pub ttl: Duration,

    /// Live entries per request kind
    pub counts_by_kind: BTreeMap<RequestKind, usize>,

    /// Counters accumulated since startup
    pub metrics: CacheMetrics,
}

impl CacheStats {
    /// Number of live entries of one kind
    pub fn count_for(&self, kind: RequestKind) -> usize {
        self.counts_by_kind.get(&kind).copied().unwrap_or(0)
    }
}
