//! Overlay service
//!
//! The process-wide overlay state: the stack of active contexts, the scroll
//! lock counter and the inert/aria-hidden marks applied to background
//! content. All of it is mutated only through `activate`, `deactivate` and
//! `reset`.

use md_dom::{Document, NodeId};

/// One active overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayContext {
    pub root: NodeId,
    /// Element focused right before activation
    pub previous_focus: Option<NodeId>,
    /// Activation order; strictly increasing
    pub position: u64,
    /// Whether this context holds one unit of the scroll lock
    pub owns_lock: bool,
}

/// Attribute values an inert pass overwrote
#[derive(Debug, Clone)]
struct InertRecord {
    node: NodeId,
    inert: Option<String>,
    aria_hidden: Option<String>,
}

/// Overlay stack, scroll lock and background inertness
#[derive(Debug, Default)]
pub struct OverlayService {
    stack: Vec<OverlayContext>,
    next_position: u64,
    lock_count: usize,
    /// Body `overflow` before the lock was applied
    saved_overflow: Option<Option<String>>,
    inert: Vec<InertRecord>,
}

impl OverlayService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a context for `root`.
    ///
    /// Returns the new stack position, or None if `root` is already active
    /// or not in the document.
    pub fn activate(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        previous_focus: Option<NodeId>,
        lock: bool,
    ) -> Option<u64> {
        if self.contains(root) {
            tracing::debug!("overlay {} is already active", root);
            return None;
        }
        if !doc.is_connected(root) {
            tracing::debug!("overlay {} is not in the document", root);
            return None;
        }

        self.next_position += 1;
        let position = self.next_position;
        self.stack.push(OverlayContext { root, previous_focus, position, owns_lock: lock });
        if lock {
            self.acquire_lock(doc);
        }
        self.refresh_inert(doc);

        tracing::debug!("overlay {} activated at position {} (depth {})", root, position, self.stack.len());
        Some(position)
    }

    /// Remove the context for `root`, wherever it sits in the stack
    pub fn deactivate(&mut self, doc: &mut Document, root: NodeId) -> Option<OverlayContext> {
        let index = self.stack.iter().position(|c| c.root == root)?;
        let context = self.stack.remove(index);
        if context.owns_lock {
            self.release_lock(doc);
        }
        self.refresh_inert(doc);

        tracing::debug!("overlay {} deactivated (depth {})", root, self.stack.len());
        Some(context)
    }

    /// Drop every context, undoing the lock and inert marks.
    ///
    /// Returns the contexts bottom first.
    pub fn reset(&mut self, doc: &mut Document) -> Vec<OverlayContext> {
        self.restore_inert(doc);
        let contexts = std::mem::take(&mut self.stack);
        for context in contexts.iter().filter(|c| c.owns_lock) {
            tracing::trace!("releasing scroll lock held by {}", context.root);
            self.release_lock(doc);
        }
        if !contexts.is_empty() {
            tracing::debug!("overlay service reset, {} contexts dropped", contexts.len());
        }
        contexts
    }

    pub fn top(&self) -> Option<&OverlayContext> {
        self.stack.last()
    }

    pub fn is_top(&self, root: NodeId) -> bool {
        self.top().is_some_and(|c| c.root == root)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn contains(&self, root: NodeId) -> bool {
        self.stack.iter().any(|c| c.root == root)
    }

    pub fn context(&self, root: NodeId) -> Option<&OverlayContext> {
        self.stack.iter().find(|c| c.root == root)
    }

    /// Contexts, bottom first
    pub fn contexts(&self) -> &[OverlayContext] {
        &self.stack
    }

    /// Current scroll lock count
    pub fn lock_count(&self) -> usize {
        self.lock_count
    }

    pub fn is_locked(&self) -> bool {
        self.lock_count > 0
    }

    /// Elements currently marked inert by the service
    pub fn inert_count(&self) -> usize {
        self.inert.len()
    }

    // ========================================================================
    // Scroll lock
    // ========================================================================

    fn acquire_lock(&mut self, doc: &mut Document) {
        self.lock_count += 1;
        if self.lock_count == 1 {
            let body = doc.body();
            self.saved_overflow = Some(doc.style_property(body, "overflow"));
            doc.set_style_property(body, "overflow", "hidden");
            tracing::debug!("scroll lock applied");
        }
    }

    fn release_lock(&mut self, doc: &mut Document) {
        if self.lock_count == 0 {
            tracing::warn!("scroll lock released while not held");
            return;
        }
        self.lock_count -= 1;
        if self.lock_count > 0 {
            return;
        }
        let body = doc.body();
        match self.saved_overflow.take().flatten() {
            Some(prior) => {
                doc.set_style_property(body, "overflow", &prior);
            }
            None => {
                doc.remove_style_property(body, "overflow");
            }
        }
        tracing::debug!("scroll lock released");
    }

    // ========================================================================
    // Inert background
    // ========================================================================

    /// Mark everything outside the topmost context inert
    fn refresh_inert(&mut self, doc: &mut Document) {
        self.restore_inert(doc);
        let Some(top) = self.top().map(|c| c.root) else {
            return;
        };

        // Siblings of the top root and of each of its ancestors up to <body>
        let (body, html) = (doc.body(), doc.document_element());
        let mut targets = Vec::new();
        let mut node = top;
        while node != body && node != html {
            let Some(parent) = doc.tree().parent(node) else {
                break;
            };
            targets.extend(doc.tree().element_children(parent).filter(|c| *c != node));
            node = parent;
        }

        for target in targets {
            self.inert.push(InertRecord {
                node: target,
                inert: doc.get_attr(target, "inert").map(String::from),
                aria_hidden: doc.get_attr(target, "aria-hidden").map(String::from),
            });
            for (name, value) in [("inert", ""), ("aria-hidden", "true")] {
                if let Err(err) = doc.set_attr(target, name, value) {
                    tracing::warn!("cannot mark {} inert: {}", target, err);
                }
            }
        }
        tracing::trace!("{} elements inert behind {}", self.inert.len(), top);
    }

    fn restore_inert(&mut self, doc: &mut Document) {
        for record in self.inert.drain(..).rev() {
            if !doc.is_alive(record.node) {
                continue;
            }
            restore_attr(doc, record.node, "inert", record.inert.as_deref());
            restore_attr(doc, record.node, "aria-hidden", record.aria_hidden.as_deref());
        }
    }
}

fn restore_attr(doc: &mut Document, node: NodeId, name: &str, value: Option<&str>) {
    match value {
        Some(v) => {
            if let Err(err) = doc.set_attr(node, name, v) {
                tracing::warn!("cannot restore {} on {}: {}", name, node, err);
            }
        }
        None => {
            doc.remove_attr(node, name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let main = doc.create_element("main");
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        for node in [main, first, second] {
            doc.append_child(body, node).unwrap();
        }
        (doc, main, first, second)
    }

    #[test]
    fn test_positions_increase() {
        let (mut doc, _, first, second) = setup();
        let mut service = OverlayService::new();
        let a = service.activate(&mut doc, first, None, true).unwrap();
        let b = service.activate(&mut doc, second, None, true).unwrap();
        assert!(b > a);
        assert!(service.is_top(second));
        assert_eq!(service.activate(&mut doc, second, None, true), None);

        service.deactivate(&mut doc, second);
        let c = service.activate(&mut doc, second, None, true).unwrap();
        assert!(c > b);
    }

    #[test]
    fn test_lock_counter_and_body_overflow() {
        let (mut doc, _, first, second) = setup();
        let body = doc.body();
        doc.set_style_property(body, "overflow", "auto");
        let mut service = OverlayService::new();

        service.activate(&mut doc, first, None, true);
        service.activate(&mut doc, second, None, true);
        assert_eq!(service.lock_count(), 2);
        assert_eq!(doc.style_property(body, "overflow"), Some("hidden".into()));

        // Bottom first
        service.deactivate(&mut doc, first);
        assert_eq!(service.lock_count(), 1);
        assert_eq!(doc.style_property(body, "overflow"), Some("hidden".into()));
        service.deactivate(&mut doc, second);
        assert_eq!(service.lock_count(), 0);
        assert_eq!(doc.style_property(body, "overflow"), Some("auto".into()));
    }

    #[test]
    fn test_unlocked_context_leaves_counter() {
        let (mut doc, _, first, _) = setup();
        let mut service = OverlayService::new();
        service.activate(&mut doc, first, None, false);
        assert_eq!(service.lock_count(), 0);
        assert_eq!(doc.style_property(doc.body(), "overflow"), None);
        service.deactivate(&mut doc, first);
        assert_eq!(service.lock_count(), 0);
    }

    #[test]
    fn test_inert_marks_values() {
        let (mut doc, main, first, _) = setup();
        let mut service = OverlayService::new();
        service.activate(&mut doc, first, None, false);
        assert_eq!(doc.get_attr(main, "inert"), Some(""));
        assert_eq!(doc.get_attr(main, "aria-hidden"), Some("true"));
        assert_eq!(service.inert_count(), 2);
    }

    #[test]
    fn test_inert_follows_top() {
        let (mut doc, main, first, second) = setup();
        doc.set_attr(main, "aria-hidden", "false").unwrap();
        let mut service = OverlayService::new();

        service.activate(&mut doc, first, None, false);
        assert!(doc.has_attr(main, "inert"));
        assert!(doc.has_attr(second, "inert"));
        assert!(!doc.has_attr(first, "inert"));

        service.activate(&mut doc, second, None, false);
        assert!(doc.has_attr(first, "inert"));
        assert!(!doc.has_attr(second, "inert"));

        service.deactivate(&mut doc, second);
        service.deactivate(&mut doc, first);
        assert!(!doc.has_attr(main, "inert"));
        assert_eq!(doc.get_attr(main, "aria-hidden"), Some("false"));
        assert_eq!(doc.get_attr(second, "aria-hidden"), None);
        assert_eq!(service.inert_count(), 0);
    }

    #[test]
    fn test_reset_unwinds() {
        let (mut doc, main, first, second) = setup();
        let mut service = OverlayService::new();
        service.activate(&mut doc, first, None, true);
        service.activate(&mut doc, second, None, true);

        let dropped = service.reset(&mut doc);
        assert_eq!(dropped.iter().map(|c| c.root).collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(service.lock_count(), 0);
        assert!(!doc.has_attr(main, "inert"));
        assert_eq!(doc.style_property(doc.body(), "overflow"), None);
    }

    #[test]
    fn test_release_without_lock_saturates() {
        let (mut doc, ..) = setup();
        let mut service = OverlayService::new();
        service.release_lock(&mut doc);
        assert_eq!(service.lock_count(), 0);
    }
}
