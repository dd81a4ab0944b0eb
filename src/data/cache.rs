//! TTL-bounded topic cache.
//!
//! Keys follow the original wire contract:
//! `tag.lowercase|context|with-pinned/no-pinned|count`. Entries expire
//! after [`CACHE_TTL`] and are evicted lazily on read. The map itself is
//! unbounded apart from explicit clearing.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::Topic;

/// How long a cached topic set stays valid.
pub const CACHE_TTL: Duration = Duration::from_millis(120_000);

struct CacheEntry {
    topics: Vec<Topic>,
    stored_at: Instant,
}

/// Process-wide (per data source) topic cache.
pub struct TopicCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for TopicCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    /// Custom TTL, used by tests to exercise expiry without sleeping.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Build the cache key for a query's identifying fields.
    pub fn key(tag: &str, cache_context: &str, include_pinned: bool, count: usize) -> String {
        format!(
            "{}|{}|{}|{}",
            tag.to_lowercase(),
            if cache_context.is_empty() {
                "default"
            } else {
                cache_context
            },
            if include_pinned { "with-pinned" } else { "no-pinned" },
            count
        )
    }

    /// Read a live entry, returning a defensive copy. Expired entries are
    /// evicted and miss.
    pub fn read(&mut self, key: &str) -> Option<Vec<Topic>> {
        let live = match self.entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() <= self.ttl,
            None => return None,
        };
        if !live {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.topics.clone())
    }

    pub fn store(&mut self, key: &str, topics: &[Topic]) {
        self.entries.insert(
            key.to_owned(),
            CacheEntry {
                topics: topics.to_vec(),
                stored_at: Instant::now(),
            },
        );
    }

    /// Purge everything, or only entries belonging to one cache context.
    pub fn clear(&mut self, cache_context: Option<&str>) {
        match cache_context {
            None => self.entries.clear(),
            Some(context) => {
                let needle = format!("|{context}|");
                self.entries.retain(|key, _| !key.contains(&needle));
            }
        }
    }

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

    fn topic(id: u64) -> Topic {
        serde_json::from_str(&format!("{{\"id\": {id}}}")).unwrap()
    }

    #[test]
    fn key_normalizes_tag_and_context() {
        assert_eq!(
            TopicCache::key("JamWeek", "/latest", false, 5),
            "jamweek|/latest|no-pinned|5"
        );
        assert_eq!(
            TopicCache::key("jam", "", true, 3),
            "jam|default|with-pinned|3"
        );
    }

    #[test]
    fn read_returns_a_copy_within_ttl() {
        let mut cache = TopicCache::new();
        cache.store("k", &[topic(1), topic(2)]);
        let first = cache.read("k").expect("hit");
        let second = cache.read("k").expect("hit again");
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn expired_entries_miss_and_are_evicted() {
        let mut cache = TopicCache::with_ttl(Duration::ZERO);
        cache.store("k", &[topic(1)]);
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.read("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_by_context_only_touches_matching_entries() {
        let mut cache = TopicCache::new();
        cache.store(&TopicCache::key("jam", "/latest", false, 5), &[topic(1)]);
        cache.store(&TopicCache::key("jam", "/top", false, 5), &[topic(2)]);
        cache.clear(Some("/latest"));
        assert_eq!(cache.len(), 1);
        assert!(cache.read(&TopicCache::key("jam", "/top", false, 5)).is_some());

        cache.clear(None);
        assert!(cache.is_empty());
    }
}
