//! Entry validity against a TTL.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::entry::CacheEntry;

/// Returns true iff `now - created_at < ttl`. A missing entry is never valid.
pub fn is_valid(entry: Option<&CacheEntry>, now: DateTime<Utc>, ttl: Duration) -> bool {
    let Some(entry) = entry else {
        return false;
    };
    match chrono::Duration::from_std(ttl) {
        Ok(ttl) => entry.age(now) < ttl,
        // TTL beyond chrono's range never expires
        Err(_) => true,
    }
}
