//! Topic data layer.
//!
//! - [`Topic`] / [`TopicListResponse`] — the `{ topic_list: { topics } }`
//!   wire format
//! - [`FeaturedTopicQuery`] — immutable per-fetch identity; its serialized
//!   signature keys both the cache and stale-response detection
//! - [`fetch`] — the HTTP client seam
//! - [`cache`] — TTL-bounded topic cache
//! - [`source`] — fetch/filter/shuffle pipeline over the two above

pub mod cache;
pub mod fetch;
pub mod source;

use serde::Deserialize;
use thiserror::Error;

/// Most topics the widget will ever request.
pub const MAX_TOPIC_COUNT: usize = 30;

/// Error from the topic data layer. Propagated unmodified to the caller;
/// there is no retry at this level.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("topic request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid topics url: {0}")]
    Url(#[from] url::ParseError),
    #[error("malformed topic list response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A forum topic as delivered by the tagged-topics endpoint. Read-only to
/// this crate; lenient defaults because hosts omit fields freely.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Topic {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fancy_title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub posters: Vec<Poster>,
    #[serde(default)]
    pub bumped_at: Option<String>,
    #[serde(default)]
    pub last_posted_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Poster {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicListResponse {
    pub topic_list: TopicList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicList {
    #[serde(default)]
    pub topics: Vec<Topic>,
}

/// Identity of one topic fetch. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturedTopicQuery {
    pub tag: String,
    pub topic_count: usize,
    pub include_pinned: bool,
    pub shuffle: bool,
    pub cache_context: String,
    pub locale: String,
}

impl FeaturedTopicQuery {
    /// Serialized identity used for in-flight coalescing and
    /// stale-response detection at the viewmodel.
    pub fn fetch_signature(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.locale,
            self.tag.to_lowercase(),
            self.topic_count,
            self.include_pinned,
            self.shuffle,
            self.cache_context
        )
    }
}

/// Clamp a raw topic count into `[0, MAX_TOPIC_COUNT]`, truncating.
pub fn sanitize_topic_count(raw: f64) -> usize {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    (raw.floor() as usize).min(MAX_TOPIC_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_and_truncates() {
        assert_eq!(sanitize_topic_count(5.9), 5);
        assert_eq!(sanitize_topic_count(0.0), 0);
        assert_eq!(sanitize_topic_count(-2.0), 0);
        assert_eq!(sanitize_topic_count(99.0), MAX_TOPIC_COUNT);
        assert_eq!(sanitize_topic_count(f64::NAN), 0);
    }

    #[test]
    fn decodes_topic_list_wire_format() {
        let response: TopicListResponse = serde_json::from_str(
            r#"{
                "topic_list": {
                    "topics": [
                        {"id": 7, "title": "Jam results", "slug": "jam-results",
                         "tags": ["jam"], "pinned": true,
                         "thumbnails": [{"url": "/up/1.png", "width": 400}],
                         "posters": [{"user_id": 3, "description": "Original Poster"}]}
                    ]
                }
            }"#,
        )
        .unwrap();
        let topic = &response.topic_list.topics[0];
        assert_eq!(topic.id, 7);
        assert!(topic.pinned);
        assert_eq!(topic.thumbnails[0].url, "/up/1.png");
        assert_eq!(topic.posters[0].user_id, Some(3));
        // omitted fields default
        assert!(topic.excerpt.is_none());
    }

    #[test]
    fn signature_lowercases_tag() {
        let query = FeaturedTopicQuery {
            tag: "JamWeek".into(),
            topic_count: 5,
            include_pinned: false,
            shuffle: true,
            cache_context: "/latest".into(),
            locale: "en".into(),
        };
        assert_eq!(query.fetch_signature(), "en|jamweek|5|false|true|/latest");
    }
}
