//! Placement engine.
//!
//! Owns the mutable placement state for one widget instance and
//! reconciles where the slider lives on every navigation change and every
//! structural mutation of the host list. The engine is an explicitly
//! constructed object with the widget's lifetime — no ambient globals.
//!
//! State machine: `Disabled` → (route enabled) → `AwaitingElements` →
//! (anchor + slider found) → `Placed` → (route disabled) → `Hidden`.
//! Placement passes are deferred to animation-frame ticks (`run_frame`) so
//! the host's own re-render settles first; the wait for not-yet-rendered
//! elements is bounded per trigger rather than polled forever.

pub mod mount;
pub mod wrapper;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{resolve_placement_settings, InsertMode, SliderSettings};
use crate::dom::probe::{query_topic_list_elements, TopicListElements};
use crate::dom::{Document, NodeId, ObserverId};
use crate::route::{is_route_enabled, RouteInfo};
use mount::{AnchorMount, MountStrategy};
use wrapper::{ensure_block_wrapper, ensure_row_wrapper};

/// Frames a scheduled placement will wait for missing anchor/slider
/// elements before giving up until the next trigger (~2 s at 60 fps).
pub const MAX_WAIT_FRAMES: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Not enabled for the current route, no elements held.
    Disabled,
    /// Enabled, waiting for the anchor/slider to appear in the DOM.
    AwaitingElements,
    /// Slider currently relocated per config.
    Placed,
    /// Disabled for the current route but elements preserved, anchor
    /// hidden.
    Hidden,
}

/// Reconciles one slider against one host list.
pub struct PlacementEngine {
    settings: SliderSettings,
    mount: Box<dyn MountStrategy>,
    status: EngineStatus,
    anchor: Option<NodeId>,
    slider: Option<NodeId>,
    row_wrapper: Option<NodeId>,
    block_wrapper: Option<NodeId>,
    /// Drawn once per placement session so random placement does not
    /// jitter on every list mutation.
    random_target_index: Option<usize>,
    observer: Option<ObserverId>,
    observer_target: Option<NodeId>,
    last_route_key: Option<String>,
    pending_placement: bool,
    wait_frames_left: u32,
    rng: SmallRng,
}

impl PlacementEngine {
    pub fn new(settings: SliderSettings) -> Self {
        Self::with_mount(settings, Box::new(AnchorMount))
    }

    pub fn with_mount(settings: SliderSettings, mount: Box<dyn MountStrategy>) -> Self {
        Self {
            settings,
            mount,
            status: EngineStatus::Disabled,
            anchor: None,
            slider: None,
            row_wrapper: None,
            block_wrapper: None,
            random_target_index: None,
            observer: None,
            observer_target: None,
            last_route_key: None,
            pending_placement: false,
            wait_frames_left: 0,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic random placement, for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    // ─── Introspection ───────────────────────────────────────────────────

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn slider(&self) -> Option<NodeId> {
        self.slider
    }

    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    pub fn row_wrapper(&self) -> Option<NodeId> {
        self.row_wrapper
    }

    pub fn block_wrapper(&self) -> Option<NodeId> {
        self.block_wrapper
    }

    /// The mutation observer currently registered on the list container,
    /// so a driver can route drained mutation events here.
    pub fn observer_id(&self) -> Option<ObserverId> {
        self.observer
    }

    /// Whether another animation-frame tick is wanted.
    pub fn needs_frame(&self) -> bool {
        self.pending_placement
    }

    // ─── Triggers ────────────────────────────────────────────────────────

    /// Navigation-change signal. No-ops when the location key is
    /// unchanged; otherwise re-evaluates the route gate and either tears
    /// down or starts a new placement session.
    pub fn handle_navigation(&mut self, doc: &mut Document, route: &RouteInfo) {
        let route_key = route.route_key();
        if self.last_route_key.as_deref() == Some(route_key.as_str()) {
            return;
        }
        self.last_route_key = Some(route_key);

        let enabled = is_route_enabled(
            &self.settings.show_on,
            route.route_name.as_deref(),
            &route.pathname,
        );
        if !enabled {
            self.teardown(doc, true);
            return;
        }

        if let Some(anchor) = self.anchor {
            doc.clear_display_none(anchor);
        }
        self.ensure_observer(doc);
        // new placement session: the random target is drawn fresh
        self.random_target_index = None;
        self.schedule_placement();
        if self.status != EngineStatus::Placed {
            self.status = EngineStatus::AwaitingElements;
        }
    }

    /// Structural-mutation signal from the list container. The host owns
    /// the row set and may replace it at any time, invalidating the chosen
    /// row index.
    pub fn handle_list_mutation(&mut self, _doc: &mut Document) {
        if matches!(
            self.status,
            EngineStatus::Placed | EngineStatus::AwaitingElements
        ) {
            self.schedule_placement();
        }
    }

    /// One animation-frame tick. Returns whether another tick is wanted.
    pub fn run_frame(&mut self, doc: &mut Document) -> bool {
        if !self.pending_placement {
            return false;
        }

        if self.anchor.map_or(true, |a| !doc.is_connected(a)) {
            self.anchor = self.mount.acquire_anchor(doc);
        }
        if self.slider.is_none() {
            self.slider = self.mount.acquire_slider(doc);
        }

        let (Some(anchor), Some(_)) = (self.anchor, self.slider) else {
            return self.wait_or_give_up();
        };

        doc.clear_display_none(anchor);
        self.ensure_observer(doc);
        self.run_placement(doc);
        self.pending_placement = false;
        self.status = EngineStatus::Placed;
        false
    }

    /// Tear down placement. With `hide_only` the elements are preserved
    /// and the anchor is hidden (route-disabled); without it the engine
    /// releases the slider entirely (unmount).
    pub fn teardown(&mut self, doc: &mut Document, hide_only: bool) {
        self.random_target_index = None;
        self.pending_placement = false;

        if let Some(row) = self.row_wrapper.take() {
            if doc.is_connected(row) {
                doc.remove(row);
            }
        }
        if let Some(block) = self.block_wrapper.take() {
            if doc.is_connected(block) {
                doc.remove(block);
            }
        }

        self.restore_slider_to_anchor(doc);
        if hide_only {
            if let Some(anchor) = self.anchor {
                doc.set_display_none(anchor);
            }
        }

        if let Some(observer) = self.observer.take() {
            doc.disconnect(observer);
        }
        self.observer_target = None;

        if hide_only && self.slider.is_some() {
            self.status = EngineStatus::Hidden;
        } else {
            self.slider = None;
            self.status = EngineStatus::Disabled;
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn schedule_placement(&mut self) {
        self.pending_placement = true;
        self.wait_frames_left = MAX_WAIT_FRAMES;
    }

    fn wait_or_give_up(&mut self) -> bool {
        self.status = EngineStatus::AwaitingElements;
        if self.wait_frames_left == 0 {
            log::warn!(
                "slider anchor/element never appeared; abandoning placement until next trigger"
            );
            self.pending_placement = false;
            return false;
        }
        self.wait_frames_left -= 1;
        true
    }

    /// Register the mutation observer on the list container. Idempotent
    /// while the container is unchanged.
    fn ensure_observer(&mut self, doc: &mut Document) {
        let Some(list_area) = doc.find_by_id("list-area") else {
            if let Some(observer) = self.observer.take() {
                doc.disconnect(observer);
            }
            self.observer_target = None;
            return;
        };

        if self.observer.is_some() && self.observer_target == Some(list_area) {
            return;
        }
        if let Some(observer) = self.observer.take() {
            doc.disconnect(observer);
        }
        self.observer = Some(doc.observe(list_area));
        self.observer_target = Some(list_area);
    }

    fn restore_slider_to_anchor(&mut self, doc: &mut Document) {
        if let (Some(anchor), Some(slider)) = (self.anchor, self.slider) {
            self.mount.restore(doc, anchor, slider);
        }
        if let Some(anchor) = self.anchor {
            doc.clear_display_none(anchor);
        }
    }

    /// Hide the anchor whenever the slider lives somewhere else.
    fn sync_anchor_visibility(&self, doc: &mut Document) {
        if let (Some(anchor), Some(slider)) = (self.anchor, self.slider) {
            if doc.parent(slider) != Some(anchor) {
                doc.set_display_none(anchor);
            }
        }
    }

    fn remove_row_wrapper(&mut self, doc: &mut Document) {
        if let Some(row) = self.row_wrapper.take() {
            if doc.is_connected(row) {
                doc.remove(row);
            }
        }
    }

    fn remove_block_wrapper(&mut self, doc: &mut Document) {
        if let Some(block) = self.block_wrapper.take() {
            if doc.is_connected(block) {
                doc.remove(block);
            }
        }
    }

    /// Adopt `wrapper` as the current block wrapper, removing any stale
    /// one so exactly one wrapper exists at a time.
    fn swap_block_wrapper(&mut self, doc: &mut Document, wrapper: NodeId) {
        if let Some(old) = self.block_wrapper {
            if old != wrapper && doc.is_connected(old) {
                doc.remove(old);
            }
        }
        self.block_wrapper = Some(wrapper);
    }

    /// Insert `node` under `parent` before `reference`, but only when it
    /// is not already exactly there. Keeping already-correct placements
    /// untouched is what makes repeated passes idempotent (and stops
    /// observer feedback loops).
    fn place_before(
        doc: &mut Document,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) {
        if reference == Some(node) {
            return;
        }
        if doc.parent(node) == Some(parent) {
            let next = doc.next_sibling(node);
            let at_target = match reference {
                Some(r) => next == Some(r),
                None => next.is_none(),
            };
            if at_target {
                return;
            }
        }
        doc.insert_before(parent, node, reference);
    }

    /// Insert the block wrapper before `reference` inside `parent`.
    fn place_block(&mut self, doc: &mut Document, parent: NodeId, reference: Option<NodeId>) {
        let Some(slider) = self.slider else { return };
        self.remove_row_wrapper(doc);
        let wrapper = ensure_block_wrapper(doc, slider);
        self.swap_block_wrapper(doc, wrapper);
        Self::place_before(doc, parent, wrapper, reference);
        self.sync_anchor_visibility(doc);
    }

    fn clamp_index(index: usize, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        index.clamp(1, upper)
    }

    /// One placement pass: re-derive config, re-probe the list, and move
    /// the slider/wrapper nodes to match.
    fn run_placement(&mut self, doc: &mut Document) {
        let Some(slider) = self.slider else { return };
        let config = resolve_placement_settings(&self.settings);

        // Static mount points own these modes; row/block logic stays out.
        if matches!(
            config.insert_mode,
            InsertMode::BeforeMain | InsertMode::BeforeNavigation
        ) {
            self.remove_row_wrapper(doc);
            self.remove_block_wrapper(doc);
            self.restore_slider_to_anchor(doc);
            return;
        }

        let Some(probe) = query_topic_list_elements(doc) else {
            // no list area at all: nothing to place against
            self.remove_row_wrapper(doc);
            self.remove_block_wrapper(doc);
            self.restore_slider_to_anchor(doc);
            return;
        };

        let Some(topic_list) = probe.topic_list else {
            // container exists but the table has not rendered: block
            // wrapper at the top of the list area
            let reference = first_child_excluding(doc, probe.list_area, self.block_wrapper);
            self.place_block(doc, probe.list_area, reference);
            return;
        };

        let list_parent = doc.parent(topic_list).unwrap_or(probe.list_area);

        match config.insert_mode {
            InsertMode::BeforeList => {
                self.place_block(doc, list_parent, Some(topic_list));
            }
            InsertMode::ListFooter => {
                let reference = doc.next_sibling(topic_list);
                self.place_block(doc, list_parent, reference);
            }
            InsertMode::AfterN => {
                if probe.body_rows.is_empty() {
                    // no row to anchor after yet
                    self.place_block(doc, list_parent, Some(topic_list));
                    return;
                }
                self.place_row(doc, slider, &probe, &config);
            }
            InsertMode::BeforeMain | InsertMode::BeforeNavigation => unreachable!(),
        }
    }

    fn place_row(
        &mut self,
        doc: &mut Document,
        slider: NodeId,
        probe: &TopicListElements,
        config: &crate::config::PlacementConfig,
    ) {
        let Some(tbody) = doc.parent(probe.body_rows[0]) else {
            self.restore_slider_to_anchor(doc);
            return;
        };
        let list_len = probe.body_rows.len();

        let target_index = if config.randomize {
            let min = Self::clamp_index(config.min_index, list_len);
            let max = Self::clamp_index(config.max_index, list_len);
            let drawn = *self.random_target_index.get_or_insert_with(|| {
                let range = max.saturating_sub(min) + 1;
                min + self.rng.gen_range(0..range)
            });
            Self::clamp_index(drawn, list_len)
        } else {
            self.random_target_index = None;
            Self::clamp_index(config.position_index, list_len)
        };

        self.remove_block_wrapper(doc);
        let row_wrapper = ensure_row_wrapper(doc, slider, probe.column_count);
        if let Some(old) = self.row_wrapper {
            if old != row_wrapper && doc.is_connected(old) {
                doc.remove(old);
            }
        }
        self.row_wrapper = Some(row_wrapper);

        let reference_row = probe.body_rows[target_index.min(list_len) - 1];
        let reference = doc.next_sibling(reference_row);
        Self::place_before(doc, tbody, row_wrapper, reference);
        self.sync_anchor_visibility(doc);
    }
}

/// First child of `parent` that is not `skip` — the insertion reference
/// for "top of container" placement.
fn first_child_excluding(doc: &Document, parent: NodeId, skip: Option<NodeId>) -> Option<NodeId> {
    doc.children(parent)
        .iter()
        .copied()
        .find(|&child| Some(child) != skip)
}
