//! Expiry sweep and size bound over a cache table.
//!
//! Both passes run before every write-back, expiry first. The size bound
//! keeps the newest entries by `created_at`; reads never change an entry's
//! priority, so this is not LRU.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::entry::CacheTable;
use super::freshness::is_valid;

/// Removes every entry that is no longer valid at `now`.
///
/// Returns the number of removed entries.
pub fn sweep_expired(table: &mut CacheTable, now: DateTime<Utc>, ttl: Duration) -> usize {
    let before = table.len();
    table.retain(|_, entry| is_valid(Some(entry), now, ttl));
    let removed = before - table.len();
    if removed > 0 {
        debug!("Expiry sweep removed {} entries", removed);
    }
    removed
}

/// Keeps only the `capacity` most recently created entries.
///
/// Equal timestamps keep key order (the sort is stable over an ordered
/// table). Returns the number of evicted entries.
pub fn enforce_capacity(table: &mut CacheTable, capacity: usize) -> usize {
    if table.len() <= capacity {
        return 0;
    }

    let mut by_recency: Vec<(&String, DateTime<Utc>)> = table
        .iter()
        .map(|(key, entry)| (key, entry.created_at))
        .collect();
    by_recency.sort_by(|a, b| b.1.cmp(&a.1));

    let evicted: Vec<String> = by_recency
        .into_iter()
        .skip(capacity)
        .map(|(key, _)| key.clone())
        .collect();

    for key in &evicted {
        table.remove(key);
    }

    debug!("Size bound evicted {} entries (capacity {})", evicted.len(), capacity);
    evicted.len()
}

/// Counts removed by one [`evict`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub expired: usize,
    pub evicted: usize,
}

/// Runs the expiry sweep, then the size bound
pub fn evict(
    table: &mut CacheTable,
    now: DateTime<Utc>,
    ttl: Duration,
    capacity: usize,
) -> EvictionReport {
    let expired = sweep_expired(table, now, ttl);
    let evicted = enforce_capacity(table, capacity);
    EvictionReport { expired, evicted }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::{CacheEntry, CachePayload, RequestKind};
    use chrono::TimeZone;

    const TTL: Duration = Duration::from_secs(300);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn insert(table: &mut CacheTable, key: &str, secs: i64) {
        table.insert(
            key.to_string(),
            CacheEntry::new(
                CachePayload::Summaries(vec![key.to_string()]),
                at(secs),
                RequestKind::Summary,
                key,
                "en",
            ),
        );
    }

    #[test]
    fn test_empty_table_is_noop() {
        let mut table = CacheTable::new();
        assert_eq!(evict(&mut table, at(0), TTL, 10), EvictionReport::default());
        assert!(table.is_empty());
    }

    #[test]
    fn test_sweep_removes_only_stale_entries() {
        let mut table = CacheTable::new();
        insert(&mut table, "old", 0);
        insert(&mut table, "edge", 100);
        insert(&mut table, "fresh", 200);

        let removed = sweep_expired(&mut table, at(400), TTL);
        assert_eq!(removed, 2);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["fresh"]);
    }

    #[test]
    fn test_all_expired_empties_table() {
        let mut table = CacheTable::new();
        insert(&mut table, "a", 0);
        insert(&mut table, "b", 1);
        assert_eq!(sweep_expired(&mut table, at(10_000), TTL), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_capacity_within_bounds_is_noop() {
        let mut table = CacheTable::new();
        insert(&mut table, "a", 0);
        insert(&mut table, "b", 1);
        assert_eq!(enforce_capacity(&mut table, 2), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_capacity_keeps_newest() {
        let mut table = CacheTable::new();
        // keys in reverse age order so key order and recency disagree
        insert(&mut table, "a", 500);
        insert(&mut table, "b", 100);
        insert(&mut table, "c", 300);
        insert(&mut table, "d", 200);

        let evicted = enforce_capacity(&mut table, 2);
        assert_eq!(evicted, 2);
        assert!(table.contains_key("a"));
        assert!(table.contains_key("c"));
    }

    #[test]
    fn test_capacity_ties_break_by_key_order() {
        let mut table = CacheTable::new();
        insert(&mut table, "z", 10);
        insert(&mut table, "m", 10);
        insert(&mut table, "a", 10);

        enforce_capacity(&mut table, 2);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["a", "m"]);
    }

    #[test]
    fn test_evict_runs_sweep_before_bound() {
        let mut table = CacheTable::new();
        insert(&mut table, "stale", 0);
        insert(&mut table, "b", 350);
        insert(&mut table, "c", 360);

        // With the stale entry gone the table already fits
        let report = evict(&mut table, at(400), TTL, 2);
        assert_eq!(report, EvictionReport { expired: 1, evicted: 0 });
        assert_eq!(table.len(), 2);
    }
}
