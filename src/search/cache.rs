//! Time-bounded memoization of complete search results

use crate::search::service::SearchResult;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// A cached search result and the moment it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: SearchResult,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Point-in-time result cache keyed by canonical query keys.
///
/// Entries older than the TTL read as misses. Expired entries are swept after
/// every write, so memory stays bounded by the distinct queries issued within
/// one TTL window. Writes to the member store are not reflected until the
/// affected entries expire.
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh entry
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh(self.ttl, now) {
            return Some(entry.value().clone());
        }

        drop(entry);
        self.entries.remove(key);
        None
    }

    /// Store a result and sweep expired entries
    pub fn put(&self, key: String, result: SearchResult) {
        self.put_at(key, result, Instant::now());
    }

    pub(crate) fn put_at(&self, key: String, result: SearchResult, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                result,
                stored_at: now,
            },
        );
        self.sweep_at(now);
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(self.ttl, now));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Swept expired search results");
        }
        removed
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries physically present, fresh or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(total: u64) -> SearchResult {
        SearchResult {
            total,
            ..Default::default()
        }
    }

    #[test]
    fn test_cache_basic_operations() {
        let cache = ResultCache::new(Duration::from_secs(60));

        cache.put("key1".to_string(), result(3));
        assert_eq!(cache.get("key1").map(|e| e.result.total), Some(3));
        assert!(cache.get("key2").is_none());

        cache.clear();
        assert!(cache.get("key1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ResultCache::new(Duration::from_secs(300));
        let stored = Instant::now();

        cache.put_at("key".to_string(), result(1), stored);
        assert!(cache
            .get_at("key", stored + Duration::from_secs(299))
            .is_some());
        assert!(cache
            .get_at("key", stored + Duration::from_secs(300))
            .is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_sweep_after_write() {
        let cache = ResultCache::new(Duration::from_secs(10));
        let start = Instant::now();

        cache.put_at("old".to_string(), result(1), start);
        cache.put_at("mid".to_string(), result(2), start + Duration::from_secs(5));
        assert_eq!(cache.len(), 2);

        cache.put_at("new".to_string(), result(3), start + Duration::from_secs(12));
        assert_eq!(cache.len(), 2);
        assert!(cache.get_at("old", start + Duration::from_secs(12)).is_none());

        assert_eq!(cache.sweep_at(start + Duration::from_secs(30)), 2);
        assert!(cache.is_empty());
    }
}
