//! Durable storage for the cache table.
//!
//! Stores are read and written wholesale. A missing or unreadable medium is
//! a cold start: [`CacheStore::load`] degrades it to an empty table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::entry::{CacheEntry, CacheTable};
use super::error::{CacheError, CacheResult};

/// Keyed store holding the whole cache table
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads the table, surfacing storage failures
    async fn try_load(&self) -> CacheResult<CacheTable>;

    /// Replaces the stored table. Last writer wins.
    async fn save(&self, table: &CacheTable) -> CacheResult<()>;

    /// Reads the table, treating any storage failure as an empty table
    async fn load(&self) -> CacheTable {
        match self.try_load().await {
            Ok(table) => table,
            Err(e) => {
                warn!("Cache storage unreadable, starting empty: {}", e);
                CacheTable::new()
            }
        }
    }
}

/// Cache table persisted as one JSON document
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Decodes entries one by one, dropping the ones that do not parse
fn decode_table(raw: BTreeMap<String, serde_json::Value>) -> CacheTable {
    raw.into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<CacheEntry>(value) {
            Ok(entry) => Some((key, entry)),
            Err(e) => {
                debug!("Dropping malformed cache entry {}: {}", key, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn try_load(&self) -> CacheResult<CacheTable> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {:?}, starting empty", self.path);
                return Ok(CacheTable::new());
            }
            Err(e) => {
                return Err(CacheError::StorageUnavailable(format!(
                    "failed to read {:?}: {}",
                    self.path, e
                )))
            }
        };

        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|e| {
                CacheError::StorageUnavailable(format!("corrupt cache file {:?}: {}", self.path, e))
            })?;

        Ok(decode_table(raw))
    }

    async fn save(&self, table: &CacheTable) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec(table)?;
        let temp_path = self.temp_path();

        // Write then rename so readers never see a half-written table
        fs::write(&temp_path, &bytes).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved {} cache entries to {:?}", table.len(), self.path);
        Ok(())
    }
}

/// In-process store, mainly for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<CacheTable>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every load and save fail until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Current stored table, bypassing failure simulation
    pub async fn snapshot(&self) -> CacheTable {
        self.table.read().await.clone()
    }

    fn check_available(&self) -> CacheResult<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            Err(CacheError::StorageUnavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn try_load(&self) -> CacheResult<CacheTable> {
        self.check_available()?;
        Ok(self.table.read().await.clone())
    }

    async fn save(&self, table: &CacheTable) -> CacheResult<()> {
        self.check_available()?;
        *self.table.write().await = table.clone();
        Ok(())
    }
}
