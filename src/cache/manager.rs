//! Get-or-fetch orchestration over the cache table.
//!
//! Every operation is load-mutate-save against the store, so there is no
//! separate flush step. Two locks keep concurrent callers consistent:
//! a per-key lock held across the hit check and the upstream fetch of one
//! key, and a table lock held across each load-mutate-save.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::config::{CacheConfig, CacheMetrics, CacheStats};
use super::entry::{CacheEntry, CachePayload, CacheTable, RequestKind};
use super::error::{CacheError, CacheResult};
use super::eviction::{evict, sweep_expired};
use super::freshness::is_valid;
use super::key::derive_key;
use super::store::{CacheStore, JsonFileStore};

/// Result of an upstream fetch as seen by the cache.
///
/// Only `Success` with a non-empty payload is ever written back; `Empty`
/// and `Failure` leave the table untouched so the next request retries
/// upstream.
#[derive(Debug)]
pub enum FetchOutcome {
    Empty,
    Success(CachePayload),
    Failure(anyhow::Error),
}

impl FetchOutcome {
    /// Maps a fetch result, treating an empty payload as `Empty`
    pub fn from_result<T: Into<CachePayload>>(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => {
                let payload = value.into();
                if payload.is_empty() {
                    FetchOutcome::Empty
                } else {
                    FetchOutcome::Success(payload)
                }
            }
            Err(e) => FetchOutcome::Failure(e),
        }
    }
}

/// Owns the cache table of the process
pub struct CacheManager {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,

    table_lock: AsyncMutex<()>,
    key_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,

    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    skipped_writes: AtomicU64,
}

impl CacheManager {
    /// Creates a manager over the given store
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        info!(
            "Initializing CacheManager (capacity: {}, ttl: {}s)",
            config.capacity,
            config.ttl.as_secs()
        );
        Self {
            config,
            store,
            clock: Arc::new(SystemClock),
            table_lock: AsyncMutex::new(()),
            key_locks: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            skipped_writes: AtomicU64::new(0),
        }
    }

    /// Creates a manager persisting to the JSON file named in the config
    pub fn with_file_store(config: CacheConfig) -> Self {
        let store = Arc::new(JsonFileStore::new(config.path.clone()));
        Self::new(config, store)
    }

    /// Replaces the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Serves a cached payload or fetches, caches and returns a fresh one.
    ///
    /// `fetch` receives the topic and language and runs only on a miss.
    /// Empty results are returned without being cached; failures are
    /// returned as [`CacheError::FetchFailed`].
    pub async fn get_or_fetch<F, Fut>(
        &self,
        kind: RequestKind,
        topic: &str,
        language: &str,
        fetch: F,
    ) -> CacheResult<CachePayload>
    where
        F: FnOnce(String, String) -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        let key = derive_key(kind, topic, language);
        let key_lock = self.key_lock(&key);

        let result = {
            let _guard = key_lock.lock().await;
            self.lookup_or_fetch(&key, kind, topic, language, fetch).await
        };

        self.release_key_lock(&key, key_lock);
        result
    }

    async fn lookup_or_fetch<F, Fut>(
        &self,
        key: &str,
        kind: RequestKind,
        topic: &str,
        language: &str,
        fetch: F,
    ) -> CacheResult<CachePayload>
    where
        F: FnOnce(String, String) -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        let table = self.store.load().await;
        if let Some(entry) = table.get(key) {
            if is_valid(Some(entry), self.clock.now(), self.config.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit: {} '{}' ({})", kind, topic, language);
                return Ok(entry.payload.clone());
            }
        }
        drop(table);

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss: {} '{}' ({}), fetching", kind, topic, language);

        match fetch(topic.to_string(), language.to_string()).await {
            FetchOutcome::Success(payload) if !payload.is_empty() => {
                self.write_back(key, kind, topic, language, payload.clone())
                    .await;
                Ok(payload)
            }
            FetchOutcome::Success(payload) => {
                self.skipped_writes.fetch_add(1, Ordering::Relaxed);
                debug!("Empty result for {} '{}', not cached", kind, topic);
                Ok(payload)
            }
            FetchOutcome::Empty => {
                self.skipped_writes.fetch_add(1, Ordering::Relaxed);
                debug!("Empty result for {} '{}', not cached", kind, topic);
                Ok(kind.empty_payload())
            }
            FetchOutcome::Failure(e) => {
                self.skipped_writes.fetch_add(1, Ordering::Relaxed);
                debug!("Fetch failed for {} '{}', not cached", kind, topic);
                Err(CacheError::FetchFailed(e))
            }
        }
    }

    /// Sweeps, bounds and stores the table with the new entry
    async fn write_back(
        &self,
        key: &str,
        kind: RequestKind,
        topic: &str,
        language: &str,
        payload: CachePayload,
    ) {
        if self.config.capacity == 0 {
            return;
        }

        let _guard = self.table_lock.lock().await;
        let mut table = self.store.load().await;
        let now = self.clock.now();

        // Overwrite rather than count the stale copy against capacity
        table.remove(key);
        let report = evict(&mut table, now, self.config.ttl, self.config.capacity - 1);
        self.record_removals(report.expired, report.evicted);

        table.insert(
            key.to_string(),
            CacheEntry::new(payload, now, kind, topic, language),
        );

        match self.store.save(&table).await {
            Ok(()) => debug!("Cached {} '{}' ({} entries)", kind, topic, table.len()),
            Err(e) => warn!("Failed to persist cache after fetching {} '{}': {}", kind, topic, e),
        }
    }

    /// Removes stale entries and returns how many were removed
    pub async fn clear_expired(&self) -> CacheResult<usize> {
        let _guard = self.table_lock.lock().await;
        let mut table = self.store.load().await;

        let removed = sweep_expired(&mut table, self.clock.now(), self.config.ttl);
        self.record_removals(removed, 0);
        self.store.save(&table).await?;

        if removed > 0 {
            info!("Removed {} expired cache entries", removed);
        }
        Ok(removed)
    }

    /// Empties the table, returning how many entries it held
    pub async fn clear_all(&self) -> CacheResult<usize> {
        let _guard = self.table_lock.lock().await;
        let count = self.store.load().await.len();
        self.store.save(&CacheTable::new()).await?;
        info!("Cleared cache ({} entries)", count);
        Ok(count)
    }

    /// Reports live entries per kind.
    ///
    /// Sweeps expired entries first and persists the swept table.
    pub async fn stats(&self) -> CacheStats {
        let _guard = self.table_lock.lock().await;
        let mut table = self.store.load().await;

        let removed = sweep_expired(&mut table, self.clock.now(), self.config.ttl);
        self.record_removals(removed, 0);
        if removed > 0 {
            if let Err(e) = self.store.save(&table).await {
                warn!("Failed to persist swept cache: {}", e);
            }
        }

        let mut counts_by_kind = BTreeMap::new();
        for entry in table.values() {
            *counts_by_kind.entry(entry.request_kind).or_insert(0) += 1;
        }

        CacheStats {
            total_entries: table.len(),
            capacity: self.config.capacity,
            ttl: self.config.ttl,
            counts_by_kind,
            metrics: self.metrics(),
        }
    }

    /// Returns the current counters
    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            skipped_writes: self.skipped_writes.load(Ordering::Relaxed),
        }
    }

    fn record_removals(&self, expired: usize, evicted: usize) {
        self.expirations.fetch_add(expired as u64, Ordering::Relaxed);
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
    }

    fn key_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Drops the key's lock once no other caller holds or waits on it
    fn release_key_lock(&self, key: &str, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self.key_locks.lock().unwrap_or_else(|p| p.into_inner());
        // The map and `lock` are the only references left
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::entry::NewsArticle;
    use crate::cache::store::MemoryStore;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn setup(capacity: usize) -> (CacheManager, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_epoch());
        let config = CacheConfig::with_capacity(capacity).ttl(Duration::from_secs(300));
        let manager = CacheManager::new(config, store.clone()).with_clock(clock.clone());
        (manager, store, clock)
    }

    fn articles(title: &str) -> CachePayload {
        CachePayload::Articles(vec![NewsArticle::new(title, format!("https://news/{}", title))])
    }

    async fn fetch_counted(
        manager: &CacheManager,
        topic: &str,
        calls: &AtomicUsize,
        outcome: impl FnOnce() -> FetchOutcome,
    ) -> CacheResult<CachePayload> {
        manager
            .get_or_fetch(RequestKind::News, topic, "en", |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { outcome() }
            })
            .await
    }

    #[tokio::test]
    async fn test_hit_within_ttl_skips_fetch() {
        let (manager, _store, clock) = setup(10);
        let calls = AtomicUsize::new(0);

        let first = fetch_counted(&manager, "AI", &calls, || FetchOutcome::Success(articles("a")))
            .await
            .unwrap();
        clock.set_secs(299);
        let second = fetch_counted(&manager, "AI", &calls, || FetchOutcome::Success(articles("b")))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.metrics().hits, 1);
        assert_eq!(manager.metrics().misses, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched_and_overwritten() {
        let (manager, store, clock) = setup(10);
        let calls = AtomicUsize::new(0);

        fetch_counted(&manager, "AI", &calls, || FetchOutcome::Success(articles("old")))
            .await
            .unwrap();
        clock.set_secs(300);
        let fresh = fetch_counted(&manager, "AI", &calls, || FetchOutcome::Success(articles("new")))
            .await
            .unwrap();

        assert_eq!(fresh, articles("new"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let table = store.snapshot().await;
        assert_eq!(table.len(), 1);
        let entry = table.values().next().unwrap();
        assert_eq!(entry.created_at.timestamp(), 300);
        assert_eq!(entry.payload, articles("new"));
    }

    #[tokio::test]
    async fn test_empty_result_is_not_cached() {
        let (manager, store, clock) = setup(10);
        let calls = AtomicUsize::new(0);

        // Stale entry at the requested key, fresh entry elsewhere
        fetch_counted(&manager, "nothing", &calls, || FetchOutcome::Success(articles("stale")))
            .await
            .unwrap();
        clock.set_secs(200);
        fetch_counted(&manager, "other", &calls, || FetchOutcome::Success(articles("fresh")))
            .await
            .unwrap();
        clock.set_secs(400);
        let before = store.snapshot().await;
        assert_eq!(before.len(), 2);

        let result = fetch_counted(&manager, "nothing", &calls, || FetchOutcome::Empty)
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(store.snapshot().await, before);

        // Retries upstream immediately
        fetch_counted(&manager, "nothing", &calls, || FetchOutcome::Empty)
            .await
            .unwrap();
        assert_eq!(store.snapshot().await, before);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(manager.metrics().skipped_writes, 2);
    }

    #[tokio::test]
    async fn test_topics_with_separators_do_not_share_entries() {
        let (manager, store, _clock) = setup(10);

        manager
            .get_or_fetch(RequestKind::News, "a:b", "c", |_, _| async {
                FetchOutcome::Success(articles("first"))
            })
            .await
            .unwrap();

        let calls = AtomicUsize::new(0);
        let payload = manager
            .get_or_fetch(RequestKind::News, "a", "b:c", |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { FetchOutcome::Success(articles("second")) }
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(payload, articles("second"));
        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_success_with_empty_payload_is_not_cached() {
        let (manager, store, _clock) = setup(10);
        let result = manager
            .get_or_fetch(RequestKind::Summary, "x", "en", |_, _| async {
                FetchOutcome::Success(CachePayload::Summaries(Vec::new()))
            })
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_propagates_and_is_not_cached() {
        let (manager, store, _clock) = setup(10);
        let calls = AtomicUsize::new(0);

        let result = fetch_counted(&manager, "AI", &calls, || {
            FetchOutcome::Failure(anyhow::anyhow!("upstream 500"))
        })
        .await;

        assert!(matches!(result, Err(CacheError::FetchFailed(_))));
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_receives_topic_and_language() {
        let (manager, _store, _clock) = setup(10);
        let payload = manager
            .get_or_fetch(RequestKind::News, "Rust", "de", |topic, language| async move {
                FetchOutcome::Success(articles(&format!("{}-{}", topic, language)))
            })
            .await
            .unwrap();
        assert_eq!(payload, articles("Rust-de"));
    }

    #[tokio::test]
    async fn test_size_bound_keeps_most_recent() {
        let (manager, store, clock) = setup(3);
        let calls = AtomicUsize::new(0);

        for (i, topic) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            clock.set_secs(i as i64 * 10);
            fetch_counted(&manager, topic, &calls, || FetchOutcome::Success(articles(topic)))
                .await
                .unwrap();
        }

        let table = store.snapshot().await;
        assert_eq!(table.len(), 3);
        let mut topics: Vec<_> = table.values().map(|e| e.topic.clone()).collect();
        topics.sort();
        assert_eq!(topics, vec!["c", "d", "e"]);
        assert_eq!(manager.metrics().evictions, 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_never_stores() {
        let (manager, store, _clock) = setup(0);
        let calls = AtomicUsize::new(0);
        fetch_counted(&manager, "a", &calls, || FetchOutcome::Success(articles("a")))
            .await
            .unwrap();
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_expired_counts_and_keeps_fresh() {
        let (manager, store, clock) = setup(10);
        let calls = AtomicUsize::new(0);

        fetch_counted(&manager, "old", &calls, || FetchOutcome::Success(articles("old")))
            .await
            .unwrap();
        clock.set_secs(200);
        fetch_counted(&manager, "fresh", &calls, || FetchOutcome::Success(articles("fresh")))
            .await
            .unwrap();

        clock.set_secs(350);
        assert_eq!(manager.clear_expired().await.unwrap(), 1);

        let table = store.snapshot().await;
        assert_eq!(table.len(), 1);
        assert_eq!(table.values().next().unwrap().topic, "fresh");
        assert_eq!(manager.clear_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (manager, store, _clock) = setup(10);
        let calls = AtomicUsize::new(0);
        for topic in ["a", "b"] {
            fetch_counted(&manager, topic, &calls, || FetchOutcome::Success(articles(topic)))
                .await
                .unwrap();
        }
        assert_eq!(manager.clear_all().await.unwrap(), 2);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_stats_sweeps_and_counts_by_kind() {
        let (manager, store, clock) = setup(10);

        manager
            .get_or_fetch(RequestKind::Summary, "s", "en", |_, _| async {
                FetchOutcome::Success(CachePayload::Summaries(vec!["x".into()]))
            })
            .await
            .unwrap();
        clock.set_secs(100);
        manager
            .get_or_fetch(RequestKind::Trending, "top-headlines", "us", |_, _| async {
                FetchOutcome::Success(articles("t"))
            })
            .await
            .unwrap();
        manager
            .get_or_fetch(RequestKind::News, "n", "en", |_, _| async {
                FetchOutcome::Success(articles("n"))
            })
            .await
            .unwrap();

        clock.set_secs(350);
        let stats = manager.stats().await;

        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.ttl, Duration::from_secs(300));
        assert_eq!(stats.count_for(RequestKind::Summary), 0);
        assert_eq!(stats.count_for(RequestKind::Trending), 1);
        assert_eq!(stats.count_for(RequestKind::News), 1);
        // The swept table was persisted
        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_degrades_to_always_fetch() {
        let (manager, store, _clock) = setup(10);
        store.set_unavailable(true);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let payload = fetch_counted(&manager, "AI", &calls, || FetchOutcome::Success(articles("a")))
                .await
                .unwrap();
            assert_eq!(payload, articles("a"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(manager.clear_all().await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once_per_key() {
        let (manager, _store, _clock) = setup(10);
        let manager = Arc::new(manager);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .get_or_fetch(RequestKind::News, "AI", "en", move |_, _| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        FetchOutcome::Success(articles("a"))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), articles("a"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(manager.key_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: anyhow::Result<Vec<NewsArticle>> = Ok(vec![NewsArticle::new("t", "u")]);
        assert!(matches!(FetchOutcome::from_result(ok), FetchOutcome::Success(_)));

        let empty: anyhow::Result<Vec<String>> = Ok(Vec::new());
        assert!(matches!(FetchOutcome::from_result(empty), FetchOutcome::Empty));

        let err: anyhow::Result<Vec<String>> = Err(anyhow::anyhow!("boom"));
        assert!(matches!(FetchOutcome::from_result(err), FetchOutcome::Failure(_)));
    }
}
