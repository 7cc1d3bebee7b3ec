//! Response Cache Module
//!
//! Key → (payload, expiry) map. Expired entries are treated as absent on
//! read and removed at that point; the background sweep catches the rest.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{current_timestamp_ms, CacheEntry, CacheKey, CacheStats};

// == Response Cache ==
/// Bounded in-memory store for upstream responses.
///
/// Not synchronized on its own; the application wraps it in
/// `Arc<RwLock<ResponseCache>>` and hands it to every route.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
    max_entries: usize,
}

impl ResponseCache {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_entries` responses.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Get ==
    /// Returns the live entry for `key`.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let now = current_timestamp_ms();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.stats.record_hit();
                Some(entry.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// At capacity, expired entries are purged first; if that frees nothing
    /// the entry closest to expiry is evicted.
    pub fn set(&mut self, key: CacheKey, value: Value, ttl: Duration) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room();
        }
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    // == Delete ==
    /// Removes `key`, returning whether something was stored.
    pub fn delete(&mut self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.entries = self.entries.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&mut self) {
        if self.cleanup_expired() > 0 {
            return;
        }
        let soonest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = soonest {
            self.entries.remove(&key);
            self.stats.record_eviction();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    fn key(name: &str) -> CacheKey {
        CacheKey::new("test", [("k", name)])
    }

    #[test]
    fn test_cache_new() {
        let cache = ResponseCache::new(100);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = ResponseCache::new(100);

        cache.set(key("a"), json!({"price": 1}), Duration::from_secs(60));
        let entry = cache.get(&key("a")).unwrap();

        assert_eq!(entry.value, json!({"price": 1}));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let mut cache = ResponseCache::new(100);
        assert!(cache.get(&key("nope")).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let mut cache = ResponseCache::new(100);

        cache.set(key("a"), json!("v"), Duration::from_millis(10));
        assert_eq!(cache.get(&key("a")).unwrap().value, json!("v"));

        sleep(Duration::from_millis(15));

        assert!(cache.get(&key("a")).is_none());
        assert!(cache.is_empty(), "Expired entry should be dropped on read");
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_overwrite_replaces_value_and_ttl() {
        let mut cache = ResponseCache::new(100);

        cache.set(key("a"), json!(1), Duration::from_millis(5));
        cache.set(key("a"), json!(2), Duration::from_secs(60));
        sleep(Duration::from_millis(10));

        assert_eq!(cache.get(&key("a")).unwrap().value, json!(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut cache = ResponseCache::new(100);

        cache.set(key("a"), json!(1), Duration::from_secs(60));
        assert!(cache.delete(&key("a")));
        assert!(!cache.delete(&key("a")));
        assert!(cache.get(&key("a")).is_none());
    }

    #[test]
    fn test_cleanup_expired() {
        let mut cache = ResponseCache::new(100);

        cache.set(key("short"), json!(1), Duration::from_millis(5));
        cache.set(key("long"), json!(2), Duration::from_secs(60));
        sleep(Duration::from_millis(10));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("long")).is_some());
    }

    #[test]
    fn test_capacity_prefers_purging_expired() {
        let mut cache = ResponseCache::new(2);

        cache.set(key("stale"), json!(1), Duration::from_millis(5));
        cache.set(key("fresh"), json!(2), Duration::from_secs(60));
        sleep(Duration::from_millis(10));
        cache.set(key("new"), json!(3), Duration::from_secs(60));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("fresh")).is_some());
        assert!(cache.get(&key("new")).is_some());
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_capacity_evicts_soonest_expiry() {
        let mut cache = ResponseCache::new(2);

        cache.set(key("quote"), json!(1), Duration::from_secs(10));
        cache.set(key("config"), json!(2), Duration::from_secs(600));
        cache.set(key("price"), json!(3), Duration::from_secs(600));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("quote")).is_none());
        assert!(cache.get(&key("config")).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_stats() {
        let mut cache = ResponseCache::new(100);

        cache.set(key("a"), json!(1), Duration::from_secs(60));
        cache.get(&key("a"));
        cache.get(&key("b"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }
}
