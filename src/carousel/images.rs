//! Card image resolution and topic-card projection.
//!
//! Topics rarely carry a usable image directly; the fallback chain runs
//! topic image → first thumbnail → category logo → small site logo → site
//! logo. Resolved urls are prefixed with the host's CDN base when one is
//! configured.

use crate::data::Topic;

/// Host site facts the card projection needs: category logos and the
/// site-wide fallback logos.
#[derive(Debug, Clone, Default)]
pub struct SiteInfo {
    pub categories: Vec<CategoryInfo>,
    pub logo_small_url: Option<String>,
    pub logo_url: Option<String>,
    /// CDN base prepended to relative urls, e.g. `https://cdn.example.com`.
    pub cdn_base: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryInfo {
    pub id: u64,
    pub name: String,
    pub logo_url: Option<String>,
}

impl SiteInfo {
    pub fn category(&self, id: u64) -> Option<&CategoryInfo> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Prefix a site-relative url with the CDN base. Absolute urls pass
    /// through untouched.
    pub fn with_cdn(&self, url: &str) -> String {
        match &self.cdn_base {
            Some(base) if url.starts_with('/') && !url.starts_with("//") => {
                format!("{}{}", base.trim_end_matches('/'), url)
            }
            _ => url.to_owned(),
        }
    }
}

/// A resolved card image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub url: String,
    pub alt: String,
}

/// Resolve the image for a topic card, or `None` when neither the topic
/// nor the site offers anything to show.
pub fn resolve_topic_image(topic: &Topic, site: &SiteInfo) -> Option<CardImage> {
    let url = topic
        .image_url
        .as_deref()
        .or_else(|| topic.thumbnails.first().map(|t| t.url.as_str()))
        .or_else(|| {
            topic
                .category_id
                .and_then(|id| site.category(id))
                .and_then(|category| category.logo_url.as_deref())
        })
        .or(site.logo_small_url.as_deref())
        .or(site.logo_url.as_deref())?;

    Some(CardImage {
        url: site.with_cdn(url),
        alt: display_title(topic).to_owned(),
    })
}

/// One renderable carousel card, projected from a [`Topic`].
#[derive(Debug, Clone)]
pub struct TopicCard {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub excerpt: Option<String>,
    pub image: Option<CardImage>,
    pub tags: Vec<String>,
    pub category: Option<CategoryInfo>,
    pub author: Option<String>,
    pub last_posted_at: Option<String>,
}

pub fn topic_card(topic: &Topic, site: &SiteInfo) -> TopicCard {
    let slug_or_id = topic
        .slug
        .clone()
        .unwrap_or_else(|| topic.id.to_string());
    TopicCard {
        id: topic.id,
        title: display_title(topic).to_owned(),
        url: format!("/t/{}/{}", slug_or_id, topic.id),
        excerpt: topic.excerpt.clone(),
        image: resolve_topic_image(topic, site),
        tags: topic.tags.clone(),
        category: topic
            .category_id
            .and_then(|id| site.category(id))
            .cloned(),
        // the first poster entry is the original poster
        author: topic
            .posters
            .first()
            .and_then(|poster| poster.description.clone()),
        last_posted_at: topic
            .bumped_at
            .clone()
            .or_else(|| topic.last_posted_at.clone()),
    }
}

fn display_title(topic: &Topic) -> &str {
    topic
        .fancy_title
        .as_deref()
        .filter(|title| !title.is_empty())
        .unwrap_or(&topic.title)
}
