//! HTML to [`Document`] conversion.
//!
//! Host pages arrive as markup; this parses them into the mutable arena so
//! the placement engine can work against realistic fixtures. Script/style
//! subtrees and whitespace-only text are dropped, they never matter to
//! placement.

use scraper::{ElementRef, Html, Node};

use super::{Document, NodeId, NodeKind};

/// Tags whose children should be stripped (invisible content).
const SKIP_CHILDREN: &[&str] = &["script", "style", "noscript", "svg"];

/// Parse raw HTML into a [`Document`].
pub fn parse_html(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let mut doc = Document::new();
    let root = doc.root();
    convert_element(&mut doc, root, parsed.root_element());
    doc
}

fn convert_element(doc: &mut Document, parent: NodeId, el: ElementRef<'_>) {
    let tag = el.value().name.local.as_ref().to_string();
    let node = doc.create_element(&tag);
    for (name, value) in el.value().attrs() {
        doc.set_attribute(node, name, value);
    }
    doc.append_child(parent, node);

    if SKIP_CHILDREN.contains(&tag.as_str()) {
        return;
    }

    for child_ref in el.children() {
        match child_ref.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child_ref) {
                    convert_element(doc, node, child_el);
                }
            }
            Node::Text(t) => {
                let content = t.text.to_string();
                if !content.trim().is_empty() {
                    let text = doc.create_text(content.trim());
                    doc.append_child(node, text);
                }
            }
            _ => {}
        }
    }
}

/// Serialize a subtree back to markup. Attributes are emitted in sorted
/// order so output is stable for assertions and demo printing.
pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Document => {
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
        }
        NodeKind::Text => out.push_str(doc.text(node)),
        NodeKind::Element => {
            out.push('<');
            out.push_str(doc.tag(node));
            let mut attrs: Vec<(&str, &str)> = doc.attributes(node).collect();
            attrs.sort();
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(value);
                out.push('"');
            }
            out.push('>');
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(doc.tag(node));
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_topic_list_fixture() {
        let doc = parse_html(
            r#"
            <div id="list-area">
                <table class="topic-list">
                    <tbody>
                        <tr class="topic-list-item"><td>first</td></tr>
                        <tr class="topic-list-item"><td>second</td></tr>
                    </tbody>
                </table>
            </div>
            "#,
        );

        let list_area = doc.find_by_id("list-area").expect("list area");
        let table = doc.find_by_class(list_area, "topic-list").expect("table");
        let rows = doc.find_all(table, |d, n| d.has_class(n, "topic-list-item"));
        assert_eq!(rows.len(), 2);
        let cell = doc.children(rows[0])[0];
        assert_eq!(doc.text(doc.children(cell)[0]), "first");
    }

    #[test]
    fn skips_script_content_and_blank_text() {
        let doc = parse_html("<div><script>let x = 1;</script>  \n  <p>kept</p></div>");
        let root = doc.root();
        let script = doc.find(root, |d, n| d.tag(n) == "script").expect("script");
        assert!(doc.children(script).is_empty());
        assert!(doc.find(root, |d, n| d.tag(n) == "p").is_some());
    }

    #[test]
    fn outer_html_round_trips_structure() {
        let mut doc = Document::new();
        let row = doc.create_element("tr");
        doc.set_attribute(row, "class", "featured-topic-slider-row");
        let cell = doc.create_element("td");
        doc.set_attribute(cell, "colspan", "5");
        let root = doc.root();
        doc.append_child(root, row);
        doc.append_child(row, cell);

        assert_eq!(
            outer_html(&doc, row),
            r#"<tr class="featured-topic-slider-row"><td colspan="5"></td></tr>"#
        );
    }
}
