//! Collection
//!
//! An ordered, deduplicated set of nodes produced from a selector or from
//! node references. Collections are values: every query returns a new one,
//! and mutating operations apply to each node and hand back `&Self` so calls
//! chain.

use std::ops::Index;

use md_dom::{Document, NodeId};
use serde_json::Value;

use crate::CapabilityHost;

/// Anything a collection can be resolved from
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Selector(&'a str),
    Node(NodeId),
    Nodes(&'a [NodeId]),
    Collection(&'a Collection),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(selector: &'a str) -> Self {
        Target::Selector(selector)
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(selector: &'a String) -> Self {
        Target::Selector(selector)
    }
}

impl From<NodeId> for Target<'_> {
    fn from(node: NodeId) -> Self {
        Target::Node(node)
    }
}

impl<'a> From<&'a [NodeId]> for Target<'a> {
    fn from(nodes: &'a [NodeId]) -> Self {
        Target::Nodes(nodes)
    }
}

impl<'a> From<&'a Vec<NodeId>> for Target<'a> {
    fn from(nodes: &'a Vec<NodeId>) -> Self {
        Target::Nodes(nodes)
    }
}

impl<'a> From<&'a Collection> for Target<'a> {
    fn from(collection: &'a Collection) -> Self {
        Target::Collection(collection)
    }
}

/// Ordered node set in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    nodes: Vec<NodeId>,
}

impl Collection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve a target against the whole document.
    ///
    /// Invalid selectors, dead nodes and non-matching input all produce an
    /// empty collection.
    pub fn resolve<'a>(doc: &Document, target: impl Into<Target<'a>>) -> Self {
        match target.into() {
            Target::Selector(selector) => Self::select(doc, doc.root(), selector),
            Target::Node(node) => Self::from_nodes(doc, [node]),
            Target::Nodes(nodes) => Self::from_nodes(doc, nodes.iter().copied()),
            Target::Collection(collection) => Self::from_nodes(doc, collection.iter()),
        }
    }

    fn select(doc: &Document, scope: NodeId, selector: &str) -> Self {
        match doc.query_selector_all(scope, selector) {
            Ok(nodes) => Self { nodes },
            Err(err) => {
                tracing::debug!("selector resolved to nothing: {}", err);
                Self::empty()
            }
        }
    }

    /// Build from arbitrary node references: dead ids are dropped,
    /// duplicates removed, and the result sorted into document order
    pub fn from_nodes(doc: &Document, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut nodes: Vec<NodeId> = nodes.into_iter().filter(|n| doc.is_alive(*n)).collect();
        nodes.sort_by(|a, b| doc.tree().compare_document_position(*a, *b));
        nodes.dedup();
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Single-node collection at `index` (empty when out of range)
    pub fn eq(&self, index: usize) -> Self {
        Self { nodes: self.get(index).into_iter().collect() }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Descendants of any node in the set that match `selector`
    pub fn find(&self, doc: &Document, selector: &str) -> Self {
        let found = self
            .iter()
            .flat_map(|scope| Self::select(doc, scope, selector).nodes);
        Self::from_nodes(doc, found)
    }

    /// Nodes of the set that match `selector`
    pub fn filter(&self, doc: &Document, selector: &str) -> Self {
        let Ok(parsed) = doc.parse_selector(selector) else {
            tracing::debug!("filter selector '{}' is invalid", selector);
            return Self::empty();
        };
        Self { nodes: self.iter().filter(|n| doc.matches(*n, &parsed)).collect() }
    }

    /// Nodes of the set that do not match `selector`
    pub fn not(&self, doc: &Document, selector: &str) -> Self {
        let Ok(parsed) = doc.parse_selector(selector) else {
            tracing::debug!("not selector '{}' is invalid", selector);
            return self.clone();
        };
        Self { nodes: self.iter().filter(|n| !doc.matches(*n, &parsed)).collect() }
    }

    /// Closest inclusive ancestor of each node matching `selector`
    pub fn closest(&self, doc: &Document, selector: &str) -> Self {
        let found = self
            .iter()
            .filter_map(|n| doc.closest(n, selector).ok().flatten());
        Self::from_nodes(doc, found)
    }

    /// Element parents of each node
    pub fn parent(&self, doc: &Document) -> Self {
        let parents = self
            .iter()
            .filter_map(|n| doc.tree().parent(n))
            .filter(|p| doc.is_element(*p));
        Self::from_nodes(doc, parents)
    }

    /// Element children of each node
    pub fn children(&self, doc: &Document) -> Self {
        let tree = doc.tree();
        let children = self.iter().flat_map(|n| tree.element_children(n));
        Self::from_nodes(doc, children)
    }

    // ========================================================================
    // Attributes, classes, styles
    // ========================================================================

    /// Attribute of the first node
    pub fn attr(&self, doc: &Document, name: &str) -> Option<String> {
        doc.get_attr(self.first()?, name).map(|v| v.to_string())
    }

    pub fn set_attr(&self, doc: &mut Document, name: &str, value: &str) -> &Self {
        for node in self.iter() {
            if let Err(err) = doc.set_attr(node, name, value) {
                tracing::trace!("set_attr skipped: {}", err);
            }
        }
        self
    }

    pub fn remove_attr(&self, doc: &mut Document, name: &str) -> &Self {
        for node in self.iter() {
            doc.remove_attr(node, name);
        }
        self
    }

    /// Whether any node carries the class
    pub fn has_class(&self, doc: &Document, class: &str) -> bool {
        self.iter().any(|n| doc.has_class(n, class))
    }

    pub fn add_class(&self, doc: &mut Document, class: &str) -> &Self {
        for node in self.iter() {
            doc.add_class(node, class);
        }
        self
    }

    pub fn remove_class(&self, doc: &mut Document, class: &str) -> &Self {
        for node in self.iter() {
            doc.remove_class(node, class);
        }
        self
    }

    pub fn toggle_class(&self, doc: &mut Document, class: &str, force: Option<bool>) -> &Self {
        for node in self.iter() {
            doc.toggle_class(node, class, force);
        }
        self
    }

    pub fn set_style(&self, doc: &mut Document, property: &str, value: &str) -> &Self {
        for node in self.iter() {
            doc.set_style_property(node, property, value);
        }
        self
    }

    /// Visit each node with its index
    pub fn each(&self, mut f: impl FnMut(usize, NodeId)) -> &Self {
        for (index, node) in self.iter().enumerate() {
            f(index, node);
        }
        self
    }

    // ========================================================================
    // Capabilities
    // ========================================================================

    /// Invoke a registered capability on this collection
    pub fn call<C: CapabilityHost>(&self, host: &mut C, name: &str, args: &[Value]) -> Option<Value> {
        let Some(operation) = host.capabilities().get(name) else {
            tracing::debug!("no capability named '{}'", name);
            return None;
        };
        Some(operation(host, self, args))
    }
}

impl Index<usize> for Collection {
    type Output = NodeId;

    fn index(&self, index: usize) -> &NodeId {
        &self.nodes[index]
    }
}

impl IntoIterator for Collection {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let list = doc.create_element("ul");
        let a = doc.create_element("li");
        let b = doc.create_element("li");
        doc.append_child(body, list).unwrap();
        doc.append_child(list, a).unwrap();
        doc.append_child(list, b).unwrap();
        doc.set_attr(a, "class", "item").unwrap();
        doc.set_attr(b, "class", "item last").unwrap();
        (doc, list, a, b)
    }

    #[test]
    fn test_resolve_dedupes_and_orders() {
        let (doc, list, a, b) = sample();
        let nodes = vec![b, a, b, list];
        let set = Collection::resolve(&doc, &nodes);
        assert_eq!(set.as_slice(), &[list, a, b]);
        assert_eq!(set[1], a);
    }

    #[test]
    fn test_resolve_empty_cases() {
        let (doc, ..) = sample();
        assert!(Collection::resolve(&doc, ".missing").is_empty());
        assert!(Collection::resolve(&doc, "li[").is_empty());
        assert!(Collection::resolve(&doc, NodeId::NONE).is_empty());
    }

    #[test]
    fn test_traversal() {
        let (doc, list, a, b) = sample();
        let lists = Collection::resolve(&doc, "ul");
        assert_eq!(lists.find(&doc, ".item").as_slice(), &[a, b]);
        assert_eq!(lists.children(&doc).filter(&doc, ".last").as_slice(), &[b]);
        assert_eq!(lists.children(&doc).not(&doc, ".last").as_slice(), &[a]);
        assert_eq!(lists.children(&doc).parent(&doc).as_slice(), &[list]);
        assert_eq!(Collection::resolve(&doc, b).closest(&doc, "ul").first(), Some(list));
        assert_eq!(lists.eq(3), Collection::empty());
    }

    #[test]
    fn test_chained_mutation() {
        let (mut doc, _, a, b) = sample();
        let items = Collection::resolve(&doc, ".item");
        items
            .add_class(&mut doc, "ready")
            .set_attr(&mut doc, "role", "option")
            .toggle_class(&mut doc, "last", Some(false));

        assert!(doc.has_class(a, "ready") && doc.has_class(b, "ready"));
        assert!(!doc.has_class(b, "last"));
        assert_eq!(items.attr(&doc, "role"), Some("option".to_string()));
        assert!(items.has_class(&doc, "ready"));
    }

    #[test]
    fn test_each_and_iteration() {
        let (doc, _, a, b) = sample();
        let items = Collection::resolve(&doc, "li");
        let mut seen = Vec::new();
        items.each(|i, n| seen.push((i, n)));
        assert_eq!(seen, vec![(0, a), (1, b)]);
        assert_eq!((&items).into_iter().count(), 2);
        assert_eq!(items.into_iter().last(), Some(b));
    }
}
