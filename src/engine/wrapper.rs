//! Synthetic wrapper elements.
//!
//! The slider cannot sit directly between table rows, so placement wraps
//! it in either a full-width table row (`after_n`) or a plain block
//! container (`before_list` / `list_footer` / empty-list fallback). Both
//! builders reuse the wrapper the slider already lives in, so repeated
//! passes never stack wrappers.

use crate::dom::{Document, NodeId};

pub const ROW_WRAPPER_CLASS: &str = "featured-topic-slider-row";
pub const BLOCK_WRAPPER_CLASS: &str = "featured-topic-slider-block";

/// Wrap the slider in a table row spanning `column_count` columns.
/// Reuses (and re-spans) the row the slider is already wrapped in.
pub fn ensure_row_wrapper(doc: &mut Document, slider: NodeId, column_count: usize) -> NodeId {
    let colspan = column_count.max(1).to_string();

    if let Some(row) = doc.closest(slider, |d, n| {
        d.tag(n) == "tr" && d.has_class(n, ROW_WRAPPER_CLASS)
    }) {
        if let Some(&cell) = doc.children(row).first() {
            doc.set_attribute(cell, "colspan", &colspan);
        }
        return row;
    }

    let row = doc.create_element("tr");
    doc.set_attribute(row, "class", ROW_WRAPPER_CLASS);
    let cell = doc.create_element("td");
    doc.set_attribute(cell, "colspan", &colspan);
    doc.append_child(row, cell);
    doc.append_child(cell, slider);
    row
}

/// Wrap the slider in a block container for flow-layout insertion.
/// Reuses the block the slider is already wrapped in.
pub fn ensure_block_wrapper(doc: &mut Document, slider: NodeId) -> NodeId {
    if let Some(block) = doc.closest(slider, |d, n| {
        d.tag(n) == "div" && d.has_class(n, BLOCK_WRAPPER_CLASS)
    }) {
        return block;
    }

    let block = doc.create_element("div");
    doc.set_attribute(block, "class", BLOCK_WRAPPER_CLASS);
    doc.append_child(block, slider);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_wrapper_spans_all_columns_and_holds_the_slider() {
        let mut doc = Document::new();
        let slider = doc.create_element("div");
        let row = ensure_row_wrapper(&mut doc, slider, 5);

        assert_eq!(doc.tag(row), "tr");
        assert!(doc.has_class(row, ROW_WRAPPER_CLASS));
        let cell = doc.children(row)[0];
        assert_eq!(doc.attribute(cell, "colspan"), Some("5"));
        assert_eq!(doc.parent(slider), Some(cell));
    }

    #[test]
    fn row_wrapper_is_reused_and_respanned() {
        let mut doc = Document::new();
        let slider = doc.create_element("div");
        let first = ensure_row_wrapper(&mut doc, slider, 3);
        let second = ensure_row_wrapper(&mut doc, slider, 6);

        assert_eq!(first, second);
        let cell = doc.children(first)[0];
        assert_eq!(doc.attribute(cell, "colspan"), Some("6"));
    }

    #[test]
    fn zero_columns_still_produces_a_valid_span() {
        let mut doc = Document::new();
        let slider = doc.create_element("div");
        let row = ensure_row_wrapper(&mut doc, slider, 0);
        let cell = doc.children(row)[0];
        assert_eq!(doc.attribute(cell, "colspan"), Some("1"));
    }

    #[test]
    fn block_wrapper_is_reused() {
        let mut doc = Document::new();
        let slider = doc.create_element("div");
        let first = ensure_block_wrapper(&mut doc, slider);
        let second = ensure_block_wrapper(&mut doc, slider);

        assert_eq!(first, second);
        assert_eq!(doc.parent(slider), Some(first));
        assert!(doc.has_class(first, BLOCK_WRAPPER_CLASS));
    }

    #[test]
    fn moving_between_wrapper_kinds_reparents_the_slider() {
        let mut doc = Document::new();
        let slider = doc.create_element("div");
        let row = ensure_row_wrapper(&mut doc, slider, 2);
        let block = ensure_block_wrapper(&mut doc, slider);

        assert_eq!(doc.parent(slider), Some(block));
        let cell = doc.children(row)[0];
        assert!(doc.children(cell).is_empty());
    }
}
