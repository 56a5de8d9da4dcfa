//! Periodic expiry sweep of the response cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::cache::CacheManager;

/// Background job running `clear_expired` on an interval
pub struct CacheCleanupJob {
    cache: Arc<CacheManager>,
    interval: Duration,
}

impl CacheCleanupJob {
    pub fn new(cache: Arc<CacheManager>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Runs one sweep, returning the number of removed entries
    pub async fn run_once(&self) -> usize {
        match self.cache.clear_expired().await {
            Ok(count) => {
                if count > 0 {
                    debug!("Cleanup job removed {} expired cache entries", count);
                }
                count
            }
            Err(e) => {
                error!("Cache cleanup job error: {}", e);
                0
            }
        }
    }

    /// Start the cleanup job (runs in background)
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("Cache cleanup job started (every {}s)", self.interval.as_secs());
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }
}
