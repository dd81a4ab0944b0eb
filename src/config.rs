//! Widget configuration.
//!
//! The host hands us an opaque settings object (JSON in practice). It is
//! deserialized once at the boundary into [`SliderSettings`] with lenient
//! numeric fields, then distilled into a [`PlacementConfig`] on every
//! placement evaluation via [`resolve_placement_settings`].

use serde::Deserialize;

/// Where the slider is injected relative to the host topic list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// Above the page's main content (static mount point, not row logic).
    BeforeMain,
    /// Above the list navigation bar (static mount point, not row logic).
    BeforeNavigation,
    /// Block wrapper immediately before the topic-list table.
    BeforeList,
    /// Synthetic full-width row after the configured row index.
    #[default]
    AfterN,
    /// Block wrapper immediately after the topic-list table.
    ListFooter,
}

/// Raw configuration surface, deserialized once from the host settings
/// object. Index fields stay `f64` so out-of-range or non-finite input can
/// be coerced to safe defaults instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SliderSettings {
    pub insert_mode: InsertMode,
    pub position_index: f64,
    pub randomize_position: bool,
    pub random_min_index: f64,
    pub random_max_index: f64,
    /// Pipe-separated route tokens, e.g. `"latest|top|tags"`.
    pub show_on: String,
    pub featured_tag: String,
    pub topic_count: f64,
    pub include_pinned: bool,
    pub shuffle_topics: bool,
    pub slides_desktop: f64,
    /// `"W:H"`, e.g. `"16:9"`.
    pub card_aspect_ratio: String,
    pub show_title: bool,
    pub title_text: String,
}

impl Default for SliderSettings {
    fn default() -> Self {
        Self {
            insert_mode: InsertMode::AfterN,
            position_index: 1.0,
            randomize_position: false,
            random_min_index: 1.0,
            random_max_index: 1.0,
            show_on: String::new(),
            featured_tag: String::new(),
            topic_count: 0.0,
            include_pinned: false,
            shuffle_topics: false,
            slides_desktop: 3.0,
            card_aspect_ratio: "16:9".into(),
            show_title: false,
            title_text: String::new(),
        }
    }
}

/// Normalized placement decision, derived fresh per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementConfig {
    pub insert_mode: InsertMode,
    pub randomize: bool,
    pub position_index: usize,
    pub min_index: usize,
    pub max_index: usize,
}

/// Coerce a loose numeric setting into a positive 1-based index.
/// Non-finite or non-positive values fall back.
pub fn coerce_positive_index(value: f64, fallback: usize) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return fallback;
    }
    value.floor() as usize
}

/// Translate raw settings into a [`PlacementConfig`].
///
/// Guarantees `min_index <= max_index` (swapped when the raw settings have
/// them inverted). Pure and deterministic.
pub fn resolve_placement_settings(settings: &SliderSettings) -> PlacementConfig {
    let position_index = coerce_positive_index(settings.position_index, 1);
    let mut min_index = coerce_positive_index(settings.random_min_index, 1);
    let mut max_index = coerce_positive_index(settings.random_max_index, min_index);

    if min_index > max_index {
        std::mem::swap(&mut min_index, &mut max_index);
    }

    PlacementConfig {
        insert_mode: settings.insert_mode,
        randomize: settings.randomize_position,
        position_index,
        min_index,
        max_index,
    }
}
