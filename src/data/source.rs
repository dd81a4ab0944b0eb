//! Featured-topic data source.
//!
//! The fetch/filter/shuffle pipeline feeding the carousel:
//! sanitize the count, consult the TTL cache, over-fetch when pinned
//! topics will be filtered out, truncate, optionally shuffle, store.
//!
//! This component performs no request deduplication across calls; in-flight
//! coalescing belongs to the consuming viewmodel. Errors propagate to the
//! caller unmodified, with no retry.

use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::Rng;

use super::cache::TopicCache;
use super::fetch::TopicClient;
use super::{DataError, FeaturedTopicQuery, Topic, MAX_TOPIC_COUNT};

/// Upper bound for the over-fetch page size when pinned topics are
/// filtered out post-fetch.
const MAX_PER_PAGE: usize = 50;

/// Uniform in-place permutation (Fisher–Yates via `SliceRandom`).
pub fn shuffle_in_place<T, R: Rng>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Fetches, filters, shuffles and memo-caches topic sets. Shared across
/// every carousel instance of a page; the cache lock covers only map
/// access, never the network call.
pub struct FeaturedTopicDataSource<C: TopicClient> {
    client: C,
    cache: Mutex<TopicCache>,
}

impl<C: TopicClient> FeaturedTopicDataSource<C> {
    pub fn new(client: C) -> Self {
        Self::with_cache(client, TopicCache::new())
    }

    pub fn with_cache(client: C, cache: TopicCache) -> Self {
        Self {
            client,
            cache: Mutex::new(cache),
        }
    }

    /// Fetch the topic set for `query`.
    ///
    /// Returns an empty set without a network call when the tag is blank
    /// or the sanitized count is zero; returns a cached copy on a hit
    /// within the TTL.
    pub fn fetch_featured_topics(
        &self,
        query: &FeaturedTopicQuery,
    ) -> Result<Vec<Topic>, DataError> {
        let count = query.topic_count.min(MAX_TOPIC_COUNT);
        if query.tag.trim().is_empty() || count == 0 {
            return Ok(Vec::new());
        }

        let key = TopicCache::key(&query.tag, &query.cache_context, query.include_pinned, count);
        if let Some(cached) = self.lock_cache().read(&key) {
            log::debug!("topic cache HIT: {key}");
            return Ok(cached);
        }
        log::debug!("topic cache MISS: {key}");

        // Over-fetch when pinned topics will be dropped afterwards.
        let per_page = if query.include_pinned {
            count
        } else {
            (count * 2).min(MAX_PER_PAGE)
        };

        let response = self.client.list_tagged(&query.tag, per_page)?;
        let mut topics: Vec<Topic> = response
            .topic_list
            .topics
            .into_iter()
            .filter(|topic| query.include_pinned || !topic.pinned)
            .collect();
        topics.truncate(count);

        if query.shuffle {
            shuffle_in_place(&mut topics, &mut rand::thread_rng());
        }

        self.lock_cache().store(&key, &topics);
        Ok(topics)
    }

    /// Purge all cached topic sets, or only one cache context's.
    pub fn clear_cache(&self, cache_context: Option<&str>) {
        self.lock_cache().clear(cache_context);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, TopicCache> {
        // a poisoned cache lock only means a panicking thread mid-insert;
        // the map itself is still usable
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::data::{TopicList, TopicListResponse};

    struct FakeClient {
        topics: Vec<Topic>,
        calls: AtomicUsize,
        last_per_page: AtomicUsize,
    }

    impl FakeClient {
        fn new(topics: Vec<Topic>) -> Self {
            Self {
                topics,
                calls: AtomicUsize::new(0),
                last_per_page: AtomicUsize::new(0),
            }
        }
    }

    impl TopicClient for FakeClient {
        fn list_tagged(&self, _tag: &str, per_page: usize) -> Result<TopicListResponse, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_per_page.store(per_page, Ordering::SeqCst);
            Ok(TopicListResponse {
                topic_list: TopicList {
                    topics: self.topics.clone(),
                },
            })
        }
    }

    fn topic(id: u64, pinned: bool) -> Topic {
        serde_json::from_str(&format!("{{\"id\": {id}, \"pinned\": {pinned}}}")).unwrap()
    }

    fn query(tag: &str, count: usize) -> FeaturedTopicQuery {
        FeaturedTopicQuery {
            tag: tag.into(),
            topic_count: count,
            include_pinned: false,
            shuffle: false,
            cache_context: "/latest".into(),
            locale: "en".into(),
        }
    }

    #[test]
    fn blank_tag_or_zero_count_skips_the_network() {
        let client = FakeClient::new(vec![topic(1, false)]);
        let source = FeaturedTopicDataSource::new(client);

        assert!(source.fetch_featured_topics(&query("", 5)).unwrap().is_empty());
        assert!(source.fetch_featured_topics(&query("jam", 0)).unwrap().is_empty());
        assert_eq!(source.client.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pinned_topics_are_filtered_and_count_honored() {
        let mut topics: Vec<Topic> = (1..=3).map(|id| topic(id, true)).collect();
        topics.extend((4..=10).map(|id| topic(id, false)));
        let source = FeaturedTopicDataSource::new(FakeClient::new(topics));

        let result = source.fetch_featured_topics(&query("jam", 5)).unwrap();
        assert_eq!(result.len(), 5);
        assert!(result.iter().all(|t| !t.pinned));
    }

    #[test]
    fn over_fetches_only_when_filtering_pinned() {
        let source = FeaturedTopicDataSource::new(FakeClient::new(vec![]));

        source.fetch_featured_topics(&query("jam", 10)).unwrap();
        assert_eq!(source.client.last_per_page.load(Ordering::SeqCst), 20);

        let mut with_pinned = query("jam", 10);
        with_pinned.include_pinned = true;
        source.fetch_featured_topics(&with_pinned).unwrap();
        assert_eq!(source.client.last_per_page.load(Ordering::SeqCst), 10);

        let mut large = query("jam", 30);
        large.cache_context = "/other".into();
        source.fetch_featured_topics(&large).unwrap();
        assert_eq!(source.client.last_per_page.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn identical_queries_within_ttl_hit_the_cache() {
        let topics = vec![topic(1, false), topic(2, false)];
        let source = FeaturedTopicDataSource::new(FakeClient::new(topics));

        let first = source.fetch_featured_topics(&query("jam", 2)).unwrap();
        let second = source.fetch_featured_topics(&query("jam", 2)).unwrap();
        assert_eq!(first, second);
        assert_eq!(source.client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expired_cache_refetches() {
        let topics = vec![topic(1, false)];
        let source = FeaturedTopicDataSource::with_cache(
            FakeClient::new(topics),
            TopicCache::with_ttl(std::time::Duration::ZERO),
        );

        source.fetch_featured_topics(&query("jam", 1)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        source.fetch_featured_topics(&query("jam", 1)).unwrap();
        assert_eq!(source.client.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clear_cache_by_context_forces_refetch() {
        let source = FeaturedTopicDataSource::new(FakeClient::new(vec![topic(1, false)]));
        source.fetch_featured_topics(&query("jam", 1)).unwrap();
        source.clear_cache(Some("/latest"));
        source.fetch_featured_topics(&query("jam", 1)).unwrap();
        assert_eq!(source.client.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn order_is_preserved_when_shuffle_is_off() {
        let topics: Vec<Topic> = (1..=6).map(|id| topic(id, false)).collect();
        let source = FeaturedTopicDataSource::new(FakeClient::new(topics));
        let result = source.fetch_featured_topics(&query("jam", 6)).unwrap();
        let ids: Vec<u64> = result.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn shuffle_permutes_without_changing_the_multiset() {
        let mut items: Vec<u64> = (0..50).collect();
        let original = items.clone();
        let mut rng = SmallRng::seed_from_u64(7);
        shuffle_in_place(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, original);
        // astronomically unlikely to be the identity permutation
        assert_ne!(items, original);
    }
}
