//! Topic-list probe.
//!
//! Read-only query reporting the current shape of the host list. The host
//! re-renders its rows at will, so the probe is re-executed on every
//! placement evaluation and its result is never cached.

use super::{Document, NodeId};

/// Snapshot of the host topic list at one instant.
#[derive(Debug, Clone)]
pub struct TopicListElements {
    /// The `#list-area` container.
    pub list_area: NodeId,
    /// The `.topic-list` table, if the host has rendered it yet.
    pub topic_list: Option<NodeId>,
    /// Ordered `tbody tr.topic-list-item` rows.
    pub body_rows: Vec<NodeId>,
    /// Cell count of the header row, falling back to the colgroup, then 1.
    pub column_count: usize,
}

/// Probe the document for the list area and its table.
///
/// Returns `None` when no `#list-area` exists at all; a partial result
/// (no table, no rows) when the container is there but the list has not
/// rendered yet.
pub fn query_topic_list_elements(doc: &Document) -> Option<TopicListElements> {
    let list_area = doc.find_by_id("list-area")?;

    let topic_list = doc.find_by_class(list_area, "topic-list");
    let Some(topic_list) = topic_list else {
        return Some(TopicListElements {
            list_area,
            topic_list: None,
            body_rows: Vec::new(),
            column_count: 1,
        });
    };

    let body_rows = doc.find_all(topic_list, |d, n| {
        d.tag(n) == "tr"
            && d.has_class(n, "topic-list-item")
            && d.closest(n, |d2, a| d2.tag(a) == "tbody").is_some()
    });

    let header_cells = doc
        .find(topic_list, |d, n| d.tag(n) == "thead")
        .and_then(|thead| doc.find(thead, |d, n| d.tag(n) == "tr"))
        .map(|tr| doc.children(tr).len())
        .filter(|&count| count > 0);
    let colgroup_cells = doc
        .find(topic_list, |d, n| d.tag(n) == "colgroup")
        .map(|cg| doc.children(cg).len())
        .filter(|&count| count > 0);
    let column_count = header_cells.or(colgroup_cells).unwrap_or(1);

    Some(TopicListElements {
        list_area,
        topic_list: Some(topic_list),
        body_rows,
        column_count,
    })
}
