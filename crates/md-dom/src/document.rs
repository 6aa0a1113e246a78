//! Document
//!
//! Owns the node tree together with the document-wide state that lives
//! outside of it: focus, the native listener table and parsed selectors.

use std::rc::Rc;

use crate::selector::is_disabled;
use crate::{
    DomError, DomResult, DomTree, InlineStyle, ListenerId, NativeListeners, NodeId, SelectorCache,
    SelectorError, SelectorList,
};

/// A live document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    focused: NodeId,
    listeners: NativeListeners,
    selectors: SelectorCache,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `<html><head></head><body></body></html>` skeleton
    pub fn new() -> Self {
        Self::from_tree(DomTree::new())
    }

    /// Wrap an existing tree, creating whichever of html/head/body is missing
    pub fn from_tree(mut tree: DomTree) -> Self {
        let root = tree.root();
        let html = find_child(&tree, root, "html").unwrap_or_else(|| {
            let html = tree.create_element("html");
            let _ = tree.append_child(root, html);
            html
        });
        let head = find_child(&tree, html, "head").unwrap_or_else(|| {
            let head = tree.create_element("head");
            let first = tree.children(html).next().unwrap_or(NodeId::NONE);
            let _ = tree.insert_before(html, head, first);
            head
        });
        let body = find_child(&tree, html, "body").unwrap_or_else(|| {
            let body = tree.create_element("body");
            let _ = tree.append_child(html, body);
            body
        });

        Self {
            tree,
            html,
            head,
            body,
            focused: NodeId::NONE,
            listeners: NativeListeners::new(),
            selectors: SelectorCache::default(),
        }
    }

    // ========================================================================
    // Tree access
    // ========================================================================

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn document_element(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.tree.is_alive(node)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.tree.element(node).is_some()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.is_connected(node)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.tree.element(node).map(|e| e.tag.as_str())
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.tree.create_text(content)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.tree.append_child(parent, child)
    }

    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> DomResult<()> {
        self.tree.insert_before(parent, child, reference)
    }

    /// Detach a node from its parent; focus inside it is dropped
    pub fn detach(&mut self, node: NodeId) -> DomResult<()> {
        self.tree.detach(node)?;
        if self.focused.is_valid() && !self.tree.is_connected(self.focused) {
            self.focused = NodeId::NONE;
        }
        Ok(())
    }

    /// Free a node and its subtree, dropping their native listeners
    pub fn dispose(&mut self, node: NodeId) -> Vec<NodeId> {
        let freed = self.tree.dispose(node);
        for id in &freed {
            self.listeners.clear_node(*id);
            if *id == self.focused {
                self.focused = NodeId::NONE;
            }
        }
        if !freed.is_empty() {
            tracing::trace!("disposed {} nodes under {}", freed.len(), node);
        }
        freed
    }

    // ========================================================================
    // Attributes, classes, styles
    // ========================================================================

    pub fn get_attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.tree.element(node)?.get_attr(name)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.get_attr(node, name).is_some()
    }

    /// Set an attribute; fails for non-elements
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<Option<String>> {
        let element = self.tree.element_mut(node).ok_or(DomError::NotAnElement(node))?;
        Ok(element.set_attr(name, value))
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.tree.element_mut(node)?.remove_attr(name)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.tree.element(node).is_some_and(|e| e.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.tree.element_mut(node) {
            let mut list = element.class_list();
            list.add(&[class]);
            element.set_class_list(&list);
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.tree.element_mut(node) {
            let mut list = element.class_list();
            list.remove(&[class]);
            element.set_class_list(&list);
        }
    }

    /// Toggle a class, returning whether it is now present
    pub fn toggle_class(&mut self, node: NodeId, class: &str, force: Option<bool>) -> bool {
        let Some(element) = self.tree.element_mut(node) else {
            return false;
        };
        let mut list = element.class_list();
        let state = list.toggle(class, force);
        element.set_class_list(&list);
        state
    }

    /// Parsed inline style of an element
    pub fn style(&self, node: NodeId) -> InlineStyle {
        InlineStyle::parse(self.get_attr(node, "style").unwrap_or(""))
    }

    pub fn style_property(&self, node: NodeId, property: &str) -> Option<String> {
        self.style(node).get(property).map(|v| v.to_string())
    }

    /// Set one inline style property, returning the previous value
    pub fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) -> Option<String> {
        let mut style = self.style(node);
        let previous = style.set(property, value);
        self.write_style(node, &style);
        previous
    }

    /// Remove one inline style property, returning its value
    pub fn remove_style_property(&mut self, node: NodeId, property: &str) -> Option<String> {
        let mut style = self.style(node);
        let previous = style.remove(property)?;
        self.write_style(node, &style);
        Some(previous)
    }

    fn write_style(&mut self, node: NodeId, style: &InlineStyle) {
        let Some(element) = self.tree.element_mut(node) else {
            return;
        };
        if style.is_empty() {
            element.remove_attr("style");
        } else {
            element.set_attr("style", &style.to_css());
        }
    }

    // ========================================================================
    // Selectors
    // ========================================================================

    /// Parse a selector through the document's cache
    pub fn parse_selector(&self, selector: &str) -> Result<Rc<SelectorList>, SelectorError> {
        self.selectors.get(selector)
    }

    /// Whether an element matches a parsed selector
    pub fn matches(&self, node: NodeId, selector: &SelectorList) -> bool {
        selector.matches(&self.tree, self.focused_raw(), node)
    }

    pub fn matches_str(&self, node: NodeId, selector: &str) -> DomResult<bool> {
        let parsed = self.parse_selector(selector)?;
        Ok(self.matches(node, &parsed))
    }

    /// All descendant elements of `scope` matching `selector`, in document order
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let parsed = self.parse_selector(selector)?;
        Ok(self
            .tree
            .descendants(scope)
            .filter(|d| self.matches(*d, &parsed))
            .collect())
    }

    pub fn query_selector(&self, scope: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let parsed = self.parse_selector(selector)?;
        Ok(self.tree.descendants(scope).find(|d| self.matches(*d, &parsed)))
    }

    /// Closest inclusive ancestor matching `selector`
    pub fn closest(&self, node: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let parsed = self.parse_selector(selector)?;
        if self.matches(node, &parsed) {
            return Ok(Some(node));
        }
        Ok(self.tree.ancestors(node).find(|a| self.matches(*a, &parsed)))
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.root())
            .find(|d| self.tree.element(*d).is_some_and(|e| e.id() == Some(id)))
    }

    // ========================================================================
    // Focus
    // ========================================================================

    fn focused_raw(&self) -> NodeId {
        if self.focused.is_valid() && self.tree.is_connected(self.focused) {
            self.focused
        } else {
            NodeId::NONE
        }
    }

    /// Focused element, if any
    pub fn focused(&self) -> Option<NodeId> {
        let focused = self.focused_raw();
        focused.is_valid().then_some(focused)
    }

    /// Focused element, falling back to `<body>`
    pub fn active_element(&self) -> NodeId {
        self.focused().unwrap_or(self.body)
    }

    /// Move focus to `node`; returns false (focus unchanged) if it cannot take focus
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.is_focusable(node) {
            tracing::trace!("focus rejected for {}", node);
            return false;
        }
        self.focused = node;
        true
    }

    pub fn blur(&mut self) {
        self.focused = NodeId::NONE;
    }

    /// Whether an element is inside an `inert` subtree
    pub fn is_inert(&self, node: NodeId) -> bool {
        self.has_attr(node, "inert") || self.tree.ancestors(node).any(|a| self.has_attr(a, "inert"))
    }

    fn tabindex(&self, node: NodeId) -> Option<i32> {
        self.get_attr(node, "tabindex")?.trim().parse().ok()
    }

    /// Whether the element can receive focus
    pub fn is_focusable(&self, node: NodeId) -> bool {
        let Some(element) = self.tree.element(node) else {
            return false;
        };
        if !self.tree.is_connected(node) || is_disabled(&self.tree, node) || self.is_inert(node) {
            return false;
        }
        if self.tabindex(node).is_some() {
            return true;
        }
        if element
            .get_attr("contenteditable")
            .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
        {
            return true;
        }
        match element.tag.as_str() {
            "button" | "select" | "textarea" | "iframe" | "summary" => true,
            "input" => !element
                .get_attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden")),
            "a" | "area" => element.has_attr("href"),
            _ => false,
        }
    }

    /// Focusable and reachable with Tab
    pub fn is_tabbable(&self, node: NodeId) -> bool {
        self.is_focusable(node) && self.tabindex(node).is_none_or(|t| t >= 0)
    }

    /// Tabbable descendants of `container`, in document order
    pub fn tabbable_within(&self, container: NodeId) -> Vec<NodeId> {
        self.tree
            .descendants(container)
            .filter(|d| self.is_tabbable(*d))
            .collect()
    }

    // ========================================================================
    // Native listeners
    // ========================================================================

    /// Attach a native listener
    pub fn add_event_listener(&mut self, node: NodeId, event_type: &str) -> ListenerId {
        self.listeners.add(node, event_type)
    }

    pub fn remove_event_listener(&mut self, node: NodeId, event_type: &str, id: ListenerId) -> bool {
        self.listeners.remove(node, event_type, id)
    }

    pub fn listeners_for(&self, node: NodeId, event_type: &str) -> &[ListenerId] {
        self.listeners.get(node, event_type)
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners.count(node, event_type)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.total()
    }

    /// Propagation path for an event: the target, then its ancestors up to
    /// and including the document node
    pub fn event_path(&self, target: NodeId) -> Vec<NodeId> {
        if !self.tree.is_alive(target) {
            return Vec::new();
        }
        std::iter::once(target).chain(self.tree.ancestors(target)).collect()
    }
}

fn find_child(tree: &DomTree, parent: NodeId, tag: &str) -> Option<NodeId> {
    tree.element_children(parent)
        .find(|c| tree.element(*c).is_some_and(|e| e.tag == tag))
}
