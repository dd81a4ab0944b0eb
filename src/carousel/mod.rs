//! Carousel viewmodel.
//!
//! Owns one mounted widget instance's visible state — loaded topics, the
//! active card index, parallax offsets, overflow and control flags —
//! independent of where the placement engine has moved the widget's node.
//!
//! Fetching runs on a worker thread and is drained by `check_fetch` on the
//! host's tick: `load_topics` spawns the request and parks the receiver,
//! and each completed result carries the signature it was requested under
//! so out-of-order completions from rapid navigation are discarded instead
//! of overwriting newer topics.

pub mod images;

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::config::SliderSettings;
use crate::data::fetch::TopicClient;
use crate::data::source::FeaturedTopicDataSource;
use crate::data::{sanitize_topic_count, DataError, FeaturedTopicQuery, Topic};
use images::{topic_card, SiteInfo, TopicCard};

/// Horizontal extent of the scroll viewport or of one card, as measured by
/// the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub width: f64,
}

impl Rect {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    fn center(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// One card's measured extent, tagged with its slider index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardRect {
    pub index: usize,
    pub rect: Rect,
}

type FetchOutcome = (String, Result<Vec<Topic>, DataError>);

/// Reactive state for one carousel instance.
pub struct CarouselViewModel<C: TopicClient + 'static> {
    settings: SliderSettings,
    site: SiteInfo,
    source: Arc<FeaturedTopicDataSource<C>>,
    cache_context: String,
    locale: String,

    topics: Vec<Topic>,
    active_index: usize,
    is_loading: bool,
    error: Option<String>,
    /// Signature of the last successfully applied fetch.
    last_signature: Option<String>,
    /// Signature the in-flight (or most recently issued) request was built
    /// from; results arriving under any other signature are stale.
    pending_signature: Option<String>,
    fetch_rx: Option<Receiver<FetchOutcome>>,

    parallax: HashMap<usize, f64>,
    reduced_motion: bool,
    /// Unknown until the host reports the first measurement.
    overflow: Option<bool>,
    viewport_registered: bool,
}

impl<C: TopicClient + 'static> CarouselViewModel<C> {
    pub fn new(
        settings: SliderSettings,
        site: SiteInfo,
        source: Arc<FeaturedTopicDataSource<C>>,
        cache_context: &str,
        locale: &str,
    ) -> Self {
        Self {
            settings,
            site,
            source,
            cache_context: cache_context.to_owned(),
            locale: locale.to_owned(),
            topics: Vec::new(),
            active_index: 0,
            is_loading: false,
            error: None,
            last_signature: None,
            pending_signature: None,
            fetch_rx: None,
            parallax: HashMap::new(),
            reduced_motion: false,
            overflow: None,
            viewport_registered: false,
        }
    }

    // ─── Fetch lifecycle ─────────────────────────────────────────────────

    fn build_query(&self) -> FeaturedTopicQuery {
        FeaturedTopicQuery {
            tag: self.settings.featured_tag.trim().to_owned(),
            topic_count: sanitize_topic_count(self.settings.topic_count),
            include_pinned: self.settings.include_pinned,
            shuffle: self.settings.shuffle_topics,
            cache_context: self.cache_context.clone(),
            locale: self.locale.clone(),
        }
    }

    /// Issue a topic fetch unless one is already in flight (coalesced) or
    /// the current signature already produced the loaded topics. `force`
    /// bypasses both checks; forcing while in flight replaces the receiver,
    /// so the superseded worker's send fails harmlessly.
    pub fn load_topics(&mut self, force: bool) {
        if self.fetch_rx.is_some() && !force {
            return;
        }

        let query = self.build_query();
        let signature = query.fetch_signature();
        if !force && self.last_signature.as_deref() == Some(&signature) && !self.topics.is_empty()
        {
            return;
        }

        self.is_loading = true;
        self.error = None;
        self.pending_signature = Some(signature.clone());

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        thread::spawn(move || {
            let result = source.fetch_featured_topics(&query);
            let _ = tx.send((signature, result));
        });
        self.fetch_rx = Some(rx);
    }

    /// Poll the worker channel. Call once per host tick; returns true when
    /// a result was applied (or discarded), i.e. the state may have changed.
    pub fn check_fetch(&mut self) -> bool {
        let Some(rx) = &self.fetch_rx else {
            return false;
        };
        match rx.try_recv() {
            Ok((signature, outcome)) => {
                self.fetch_rx = None;
                self.apply_fetch_outcome(signature, outcome);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                // worker died without reporting; treat as a failed fetch
                self.fetch_rx = None;
                self.is_loading = false;
                self.error = Some("topic fetch worker terminated".to_owned());
                self.last_signature = None;
                true
            }
        }
    }

    fn apply_fetch_outcome(&mut self, signature: String, outcome: Result<Vec<Topic>, DataError>) {
        if self.pending_signature.as_deref() != Some(&signature) {
            log::debug!("discarding stale topic fetch: {signature}");
            return;
        }
        self.pending_signature = None;
        self.is_loading = false;

        match outcome {
            Ok(topics) => {
                self.topics = topics;
                self.active_index = 0;
                self.parallax.clear();
                self.last_signature = Some(signature);
            }
            Err(error) => {
                log::warn!("failed to load featured topics: {error}");
                self.error = Some(error.to_string());
                // cleared so the next signature check retries; previous
                // topics stay visible
                self.last_signature = None;
            }
        }
    }

    // ─── Loaded state ────────────────────────────────────────────────────

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn has_topics(&self) -> bool {
        !self.topics.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn topic_cards(&self) -> Vec<TopicCard> {
        self.topics
            .iter()
            .map(|topic| topic_card(topic, &self.site))
            .collect()
    }

    // ─── Scroll tracking & parallax ──────────────────────────────────────

    /// Idempotent viewport acquisition; a second registration while one is
    /// active is a no-op.
    pub fn register_viewport(&mut self) {
        self.viewport_registered = true;
    }

    /// Release scroll tracking. Pairs with [`register_viewport`].
    ///
    /// [`register_viewport`]: Self::register_viewport
    pub fn unregister_viewport(&mut self) {
        self.viewport_registered = false;
        self.parallax.clear();
    }

    /// Scroll handler: the card whose center is closest to the viewport
    /// center becomes active, and each card gets a normalized parallax
    /// offset (distance from center over viewport width, clamped to
    /// [-1, 1]). Parallax is suppressed entirely under reduced motion.
    pub fn handle_viewport_scroll(&mut self, viewport: Rect, cards: &[CardRect]) {
        if !self.viewport_registered || cards.is_empty() || viewport.width <= 0.0 {
            return;
        }
        let viewport_center = viewport.center();

        let mut closest_index = 0;
        let mut closest_distance = f64::INFINITY;
        for card in cards {
            let distance = (card.rect.center() - viewport_center).abs();
            if distance < closest_distance {
                closest_distance = distance;
                closest_index = card.index;
            }
        }
        self.active_index = closest_index;

        self.parallax.clear();
        if self.reduced_motion {
            return;
        }
        for card in cards {
            let offset = (card.rect.center() - viewport_center) / viewport.width;
            self.parallax.insert(card.index, offset.clamp(-1.0, 1.0));
        }
    }

    pub fn parallax_offset(&self, index: usize) -> f64 {
        self.parallax.get(&index).copied().unwrap_or(0.0)
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
        if reduced {
            self.parallax.clear();
        }
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    // ─── Controls ────────────────────────────────────────────────────────

    pub fn is_prev_disabled(&self) -> bool {
        self.active_index == 0
    }

    pub fn is_next_disabled(&self) -> bool {
        self.active_index + 1 >= self.topics.len()
    }

    /// Advance the active card. Returns the index the host should scroll
    /// into view, or `None` at the boundary.
    pub fn focus_next(&mut self) -> Option<usize> {
        self.focus_index(self.active_index.saturating_add(1))
    }

    pub fn focus_prev(&mut self) -> Option<usize> {
        self.focus_index(self.active_index.saturating_sub(1))
    }

    fn focus_index(&mut self, target: usize) -> Option<usize> {
        if self.topics.is_empty() {
            return None;
        }
        let bounded = target.min(self.topics.len() - 1);
        if bounded == self.active_index {
            return None;
        }
        self.active_index = bounded;
        Some(bounded)
    }

    /// Whether prev/next controls should render at all.
    pub fn show_controls(&self) -> bool {
        self.topics.len() > 1 && self.overflow != Some(false)
    }

    /// Record whether the scrollable content exceeds the visible width.
    /// Re-measured by the host on load, resize, and after scroll settles.
    pub fn update_overflow(&mut self, scroll_width: f64, client_width: f64) {
        self.overflow = Some(scroll_width > client_width);
    }

    pub fn overflow(&self) -> Option<bool> {
        self.overflow
    }

    // ─── Presentation ────────────────────────────────────────────────────

    pub fn show_heading(&self) -> bool {
        self.settings.show_title && !self.settings.title_text.is_empty()
    }

    pub fn title_text(&self) -> &str {
        &self.settings.title_text
    }

    /// Inline custom properties for the card layout: desktop slide count
    /// (at least 1) and the aspect ratio expressed as a padding percentage.
    pub fn slider_inline_style(&self) -> String {
        let desktop_count = if self.settings.slides_desktop.is_finite()
            && self.settings.slides_desktop >= 1.0
        {
            self.settings.slides_desktop.floor() as usize
        } else {
            3
        };
        let (width, height) = parse_aspect_ratio(&self.settings.card_aspect_ratio);
        let aspect_percent = height / width * 100.0;
        format!(
            "--featured-slider-desktop-count: {desktop_count}; --featured-slider-aspect-ratio: {aspect_percent}%;"
        )
    }
}

/// Parse `"W:H"`; unusable components fall back to 1.
fn parse_aspect_ratio(raw: &str) -> (f64, f64) {
    let mut parts = raw.split(':');
    let width = parse_dimension(parts.next());
    let height = parse_dimension(parts.next());
    (width, height)
}

fn parse_dimension(part: Option<&str>) -> f64 {
    part.and_then(|p| p.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::data::{TopicList, TopicListResponse};

    struct FakeClient {
        topics: Vec<Topic>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl TopicClient for FakeClient {
        fn list_tagged(&self, _tag: &str, _per_page: usize) -> Result<TopicListResponse, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                let bad: Result<serde_json::Value, _> = serde_json::from_str("{");
                return Err(DataError::Decode(bad.unwrap_err()));
            }
            Ok(TopicListResponse {
                topic_list: TopicList {
                    topics: self.topics.clone(),
                },
            })
        }
    }

    fn topic(id: u64) -> Topic {
        serde_json::from_str(&format!("{{\"id\": {id}, \"title\": \"t{id}\"}}")).unwrap()
    }

    fn viewmodel(
        topics: Vec<Topic>,
        fail: bool,
    ) -> (CarouselViewModel<FakeClient>, Arc<AtomicUsize>) {
        let settings = SliderSettings {
            featured_tag: "jam".into(),
            topic_count: 10.0,
            ..SliderSettings::default()
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let client = FakeClient {
            topics,
            fail,
            calls: Arc::clone(&calls),
        };
        let vm = CarouselViewModel::new(
            settings,
            SiteInfo::default(),
            Arc::new(FeaturedTopicDataSource::new(client)),
            "/latest",
            "en",
        );
        (vm, calls)
    }

    fn drain(vm: &mut CarouselViewModel<FakeClient>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !vm.check_fetch() {
            assert!(Instant::now() < deadline, "fetch never completed");
            thread::yield_now();
        }
    }

    #[test]
    fn load_applies_topics_and_resets_active_index() {
        let (mut vm, _) = viewmodel(vec![topic(1), topic(2), topic(3)], false);
        vm.active_index = 2;
        vm.load_topics(false);
        assert!(vm.is_loading());
        drain(&mut vm);

        assert!(!vm.is_loading());
        assert_eq!(vm.topics().len(), 3);
        assert_eq!(vm.active_index(), 0);
        assert!(vm.error().is_none());
    }

    #[test]
    fn unchanged_signature_with_loaded_topics_is_a_no_op() {
        let (mut vm, _) = viewmodel(vec![topic(1)], false);
        vm.load_topics(false);
        drain(&mut vm);

        vm.load_topics(false);
        assert!(vm.fetch_rx.is_none());
        assert!(!vm.is_loading());
    }

    #[test]
    fn in_flight_request_is_coalesced() {
        let (mut vm, calls) = viewmodel(vec![topic(1)], false);
        vm.load_topics(false);
        let pending = vm.pending_signature.clone();
        vm.load_topics(false);
        assert_eq!(vm.pending_signature, pending);
        drain(&mut vm);
        // the single worker issued exactly one client call
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_keeps_previous_topics_and_forces_retry() {
        let (mut vm, _) = viewmodel(vec![topic(1)], false);
        vm.load_topics(false);
        drain(&mut vm);
        assert_eq!(vm.topics().len(), 1);

        // flip the source into failure mode via a forced refetch
        vm.source = Arc::new(FeaturedTopicDataSource::new(FakeClient {
            topics: vec![],
            fail: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }));
        vm.load_topics(true);
        drain(&mut vm);

        assert!(vm.error().is_some());
        assert_eq!(vm.topics().len(), 1, "previous topics stay visible");
        assert!(vm.last_signature.is_none(), "next check retries");
    }

    #[test]
    fn stale_result_does_not_overwrite_newer_request() {
        let (mut vm, _) = viewmodel(vec![topic(1)], false);
        vm.topics = vec![topic(9)];
        vm.pending_signature = Some("newer-signature".into());

        vm.apply_fetch_outcome("older-signature".into(), Ok(vec![topic(1)]));
        assert_eq!(vm.topics[0].id, 9, "stale result discarded");
        assert_eq!(vm.pending_signature.as_deref(), Some("newer-signature"));
    }

    #[test]
    fn scroll_picks_the_centered_card_and_sets_parallax() {
        let (mut vm, _) = viewmodel(vec![], false);
        vm.topics = vec![topic(1), topic(2), topic(3)];
        vm.register_viewport();

        let viewport = Rect::new(0.0, 300.0);
        let cards = [
            CardRect { index: 0, rect: Rect::new(-100.0, 100.0) },
            CardRect { index: 1, rect: Rect::new(100.0, 100.0) },
            CardRect { index: 2, rect: Rect::new(300.0, 100.0) },
        ];
        vm.handle_viewport_scroll(viewport, &cards);

        assert_eq!(vm.active_index(), 1);
        assert_eq!(vm.parallax_offset(1), 0.0);
        assert!(vm.parallax_offset(0) < 0.0);
        assert!(vm.parallax_offset(2) > 0.0);
    }

    #[test]
    fn parallax_is_clamped_and_suppressed_under_reduced_motion() {
        let (mut vm, _) = viewmodel(vec![], false);
        vm.topics = vec![topic(1), topic(2)];
        vm.register_viewport();

        let viewport = Rect::new(0.0, 100.0);
        let cards = [
            CardRect { index: 0, rect: Rect::new(0.0, 100.0) },
            CardRect { index: 1, rect: Rect::new(1_000.0, 100.0) },
        ];
        vm.handle_viewport_scroll(viewport, &cards);
        assert_eq!(vm.parallax_offset(1), 1.0);

        vm.set_reduced_motion(true);
        assert_eq!(vm.parallax_offset(1), 0.0);
        vm.handle_viewport_scroll(viewport, &cards);
        assert_eq!(vm.parallax_offset(1), 0.0);
    }

    #[test]
    fn scroll_is_ignored_without_a_registered_viewport() {
        let (mut vm, _) = viewmodel(vec![], false);
        vm.topics = vec![topic(1), topic(2)];
        let cards = [CardRect { index: 1, rect: Rect::new(0.0, 100.0) }];
        vm.handle_viewport_scroll(Rect::new(0.0, 100.0), &cards);
        assert_eq!(vm.active_index(), 0);

        vm.register_viewport();
        vm.handle_viewport_scroll(Rect::new(0.0, 100.0), &cards);
        assert_eq!(vm.active_index(), 1);

        vm.unregister_viewport();
        assert_eq!(vm.parallax_offset(1), 0.0);
    }

    #[test]
    fn focus_navigation_clamps_at_the_boundaries() {
        let (mut vm, _) = viewmodel(vec![], false);
        vm.topics = vec![topic(1), topic(2), topic(3)];

        assert!(vm.is_prev_disabled());
        assert!(vm.focus_prev().is_none());
        assert_eq!(vm.focus_next(), Some(1));
        assert_eq!(vm.focus_next(), Some(2));
        assert!(vm.is_next_disabled());
        assert!(vm.focus_next().is_none());
        assert_eq!(vm.focus_prev(), Some(1));
    }

    #[test]
    fn controls_need_multiple_topics_and_overflow() {
        let (mut vm, _) = viewmodel(vec![], false);
        vm.topics = vec![topic(1)];
        assert!(!vm.show_controls());

        vm.topics = vec![topic(1), topic(2)];
        assert!(vm.show_controls(), "overflow unknown still shows controls");
        vm.update_overflow(500.0, 800.0);
        assert!(!vm.show_controls());
        vm.update_overflow(900.0, 800.0);
        assert!(vm.show_controls());
    }

    #[test]
    fn heading_requires_flag_and_text() {
        let (mut vm, _) = viewmodel(vec![], false);
        assert!(!vm.show_heading());
        vm.settings.show_title = true;
        assert!(!vm.show_heading());
        vm.settings.title_text = "Featured".into();
        assert!(vm.show_heading());
    }

    #[test]
    fn inline_style_derives_count_and_aspect_percent() {
        let (mut vm, _) = viewmodel(vec![], false);
        vm.settings.slides_desktop = 4.0;
        vm.settings.card_aspect_ratio = "16:9".into();
        assert_eq!(
            vm.slider_inline_style(),
            "--featured-slider-desktop-count: 4; --featured-slider-aspect-ratio: 56.25%;"
        );

        vm.settings.slides_desktop = 0.0;
        vm.settings.card_aspect_ratio = "bogus".into();
        assert_eq!(
            vm.slider_inline_style(),
            "--featured-slider-desktop-count: 3; --featured-slider-aspect-ratio: 100%;"
        );
    }
}
