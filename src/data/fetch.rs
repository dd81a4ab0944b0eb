//! HTTP client for the tagged-topics endpoint.
//!
//! [`TopicClient`] is the seam the data source (and tests) work against;
//! [`HttpTopicClient`] is the blocking reqwest implementation used in
//! production.

use std::time::Duration;

use url::Url;

use super::{DataError, TopicListResponse};

/// Fetches one page of topics for a tag.
pub trait TopicClient: Send + Sync {
    fn list_tagged(&self, tag: &str, per_page: usize) -> Result<TopicListResponse, DataError>;
}

/// Blocking HTTP implementation against a forum base URL.
pub struct HttpTopicClient {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HttpTopicClient {
    pub fn new(base_url: &str) -> Result<Self, DataError> {
        let base = Url::parse(base_url)?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(
                "featured-topic-slider/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(15))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { base, client })
    }

    fn tag_url(&self, tag: &str, per_page: usize) -> Result<Url, DataError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.pop_if_empty().push("tag");
            // path_segments_mut percent-encodes the tag for us
            segments.push(&format!("{tag}.json"));
        }
        url.query_pairs_mut()
            .append_pair("no_definitions", "true")
            .append_pair("per_page", &per_page.to_string());
        Ok(url)
    }
}

impl TopicClient for HttpTopicClient {
    fn list_tagged(&self, tag: &str, per_page: usize) -> Result<TopicListResponse, DataError> {
        let url = self.tag_url(tag, per_page)?;
        log::debug!("GET {url}");
        let body = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()?
            .error_for_status()?
            .text()?;
        let response: TopicListResponse = serde_json::from_str(&body)?;
        Ok(response)
    }
}
