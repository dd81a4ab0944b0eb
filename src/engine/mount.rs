//! Mount strategies.
//!
//! How the engine obtains its two nodes — the slider element and the
//! anchor it returns to — varies by host integration: a data-attribute
//! anchor rendered inline, or a named outlet container the widget is
//! instantiated into. One engine, parameterized by this capability,
//! replaces the near-duplicate engine variants the integrations would
//! otherwise need.

use crate::config::InsertMode;
use crate::dom::{Document, NodeId};

/// Attribute marking the slider element itself.
pub const SLIDER_ATTR: &str = "data-featured-topic-slider";
/// Attribute marking the anchor the slider returns to when not placed.
pub const ANCHOR_ATTR: &str = "data-featured-topic-slider-anchor";

/// Capability for acquiring and restoring the slider/anchor pair.
pub trait MountStrategy {
    /// Locate the anchor node, if it has been rendered yet.
    fn acquire_anchor(&self, doc: &Document) -> Option<NodeId>;
    /// Locate the slider node, if it has been rendered yet.
    fn acquire_slider(&self, doc: &Document) -> Option<NodeId>;
    /// Put the slider back where it lives when placement is torn down.
    fn restore(&self, doc: &mut Document, anchor: NodeId, slider: NodeId) {
        if doc.parent(slider) != Some(anchor) {
            doc.append_child(anchor, slider);
        }
    }
}

/// Data-attribute contract: both nodes are tagged inline by the host
/// template.
#[derive(Debug, Default)]
pub struct AnchorMount;

impl MountStrategy for AnchorMount {
    fn acquire_anchor(&self, doc: &Document) -> Option<NodeId> {
        doc.find_by_attr(doc.root(), ANCHOR_ATTR, "true")
    }

    fn acquire_slider(&self, doc: &Document) -> Option<NodeId> {
        doc.find_by_attr(doc.root(), SLIDER_ATTR, "true")
    }
}

/// Outlet contract: the widget is rendered into a named extension-point
/// element, which doubles as the anchor.
#[derive(Debug)]
pub struct OutletMount {
    pub outlet_id: String,
}

impl OutletMount {
    pub fn new(outlet_id: &str) -> Self {
        Self {
            outlet_id: outlet_id.to_owned(),
        }
    }
}

impl MountStrategy for OutletMount {
    fn acquire_anchor(&self, doc: &Document) -> Option<NodeId> {
        doc.find_by_id(&self.outlet_id)
    }

    fn acquire_slider(&self, doc: &Document) -> Option<NodeId> {
        let outlet = self.acquire_anchor(doc)?;
        doc.find_by_attr(outlet, SLIDER_ATTR, "true")
            .or_else(|| doc.find_by_attr(doc.root(), SLIDER_ATTR, "true"))
    }
}

/// Named extension points a static widget instance can be rendered at.
/// Each instance renders only when its point matches the insert mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPoint {
    BeforeMain,
    BeforeNavigation,
    Top,
    Bottom,
}

impl MountPoint {
    /// Whether a widget at this point should render for the configured
    /// insert mode.
    pub fn matches(self, insert_mode: InsertMode) -> bool {
        match self {
            Self::BeforeMain => insert_mode == InsertMode::BeforeMain,
            Self::BeforeNavigation => insert_mode == InsertMode::BeforeNavigation,
            Self::Top => {
                insert_mode == InsertMode::BeforeList || insert_mode == InsertMode::AfterN
            }
            Self::Bottom => insert_mode == InsertMode::ListFooter,
        }
    }

    /// Only the top point with `after_n` needs the placement engine to
    /// move the slider; every other combination stays where rendered.
    pub fn requires_dynamic_placement(self, insert_mode: InsertMode) -> bool {
        self == Self::Top && insert_mode == InsertMode::AfterN
    }
}
