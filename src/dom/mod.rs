//! Mutable DOM arena.
//!
//! A small identity-preserving document tree standing in for the host
//! page's DOM. Nodes are indices into an arena so they can be re-parented
//! (the whole point of slider placement) without reference cycles:
//!
//! - structure: `create_element` / `append_child` / `insert_before` /
//!   `remove`, with parent links and ordered children
//! - queries: predicate search in document order, `closest` walking up
//! - visibility: `set_display_none` / `clear_display_none` on the `style`
//!   attribute (the anchor-hiding contract)
//! - observation: `observe` a subtree for structural (child-list)
//!   mutations, drained via `take_mutations`

pub mod parser;
pub mod probe;

use std::collections::HashMap;

/// Handle to a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
}

/// Handle for a registered structural-mutation observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    tag: String,
    attributes: HashMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_owned(),
            attributes: HashMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// The document tree. One instance models one host page.
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    observers: HashMap<ObserverId, NodeId>,
    next_observer: u64,
    pending_mutations: Vec<ObserverId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            observers: HashMap::new(),
            next_observer: 0,
            pending_mutations: Vec::new(),
        };
        doc.root = doc.push(NodeData::new(NodeKind::Document, "#document"));
        doc
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0]
    }

    fn data_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.0]
    }

    // ─── Node construction & basics ──────────────────────────────────────

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::new(NodeKind::Element, tag))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Text, "");
        data.text = text.to_owned();
        self.push(data)
    }

    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.data(node).kind
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.data(node).tag
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.data(node).text
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.data(node).attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.data_mut(node)
            .attributes
            .insert(name.to_owned(), value.to_owned());
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.data_mut(node).attributes.remove(name);
    }

    pub fn attributes(&self, node: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.data(node)
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|value| value.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    // ─── Structure ───────────────────────────────────────────────────────

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == node)?;
        siblings.get(pos + 1).copied()
    }

    /// True if the node is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `node` into `parent` immediately before `reference`
    /// (or at the end when `reference` is `None` or not a child of
    /// `parent`). The node is detached from any previous parent first.
    pub fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        debug_assert_ne!(parent, node, "cannot insert a node into itself");
        self.detach(node);

        let position = reference
            .and_then(|r| self.children(parent).iter().position(|&c| c == r))
            .unwrap_or_else(|| self.children(parent).len());

        self.data_mut(parent).children.insert(position, node);
        self.data_mut(node).parent = Some(parent);
        self.record_structural_mutation(parent);
    }

    /// Detach `node` (and its subtree) from the tree. The nodes stay in the
    /// arena and can be re-inserted later.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            self.data_mut(parent).children.retain(|&c| c != node);
            self.data_mut(node).parent = None;
            self.record_structural_mutation(parent);
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// First descendant of `root` (document order, excluding `root` itself)
    /// matching the predicate.
    pub fn find(&self, root: NodeId, pred: impl Fn(&Document, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|&n| pred(self, n))
    }

    /// All descendants of `root` matching the predicate, document order.
    pub fn find_all(
        &self,
        root: NodeId,
        pred: impl Fn(&Document, NodeId) -> bool,
    ) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| pred(self, n))
            .collect()
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find(self.root, |doc, n| doc.attribute(n, "id") == Some(id))
    }

    pub fn find_by_attr(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.find(root, |doc, n| doc.attribute(n, name) == Some(value))
    }

    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find(root, |doc, n| doc.tag(n) == tag)
    }

    pub fn find_by_class(&self, root: NodeId, class: &str) -> Option<NodeId> {
        self.find(root, |doc, n| doc.has_class(n, class))
    }

    /// Nearest ancestor (including `node` itself) matching the predicate.
    pub fn closest(
        &self,
        node: NodeId,
        pred: impl Fn(&Document, NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if pred(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    // ─── Visibility ──────────────────────────────────────────────────────

    pub fn set_display_none(&mut self, node: NodeId) {
        self.set_attribute(node, "style", "display: none");
    }

    pub fn clear_display_none(&mut self, node: NodeId) {
        self.remove_attribute(node, "style");
    }

    pub fn is_display_none(&self, node: NodeId) -> bool {
        self.attribute(node, "style") == Some("display: none")
    }

    // ─── Mutation observation ────────────────────────────────────────────

    /// Watch `target` for structural mutations anywhere in its subtree.
    pub fn observe(&mut self, target: NodeId) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.insert(id, target);
        id
    }

    pub fn disconnect(&mut self, id: ObserverId) {
        self.observers.remove(&id);
        self.pending_mutations.retain(|&p| p != id);
    }

    pub fn observer_target(&self, id: ObserverId) -> Option<NodeId> {
        self.observers.get(&id).copied()
    }

    /// Drain the observers triggered since the last call. Each observer
    /// appears at most once per drain, in trigger order.
    pub fn take_mutations(&mut self) -> Vec<ObserverId> {
        std::mem::take(&mut self.pending_mutations)
    }

    fn record_structural_mutation(&mut self, parent: NodeId) {
        if self.observers.is_empty() {
            return;
        }
        let triggered: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|(_, &target)| self.is_self_or_ancestor(target, parent))
            .map(|(&id, _)| id)
            .collect();
        for id in triggered {
            if !self.pending_mutations.contains(&id) {
                self.pending_mutations.push(id);
            }
        }
    }

    fn is_self_or_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == candidate {
                return true;
            }
            current = self.parent(n);
        }
        false
    }
}
