//! Cache error types.

use thiserror::Error;

/// Errors raised by the cache layer
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream fetch failed: {0}")]
    FetchFailed(anyhow::Error),
}

impl CacheError {
    /// True for failures of the upstream source rather than the store
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, CacheError::FetchFailed(_))
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
