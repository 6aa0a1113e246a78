//! Delegation registry
//!
//! Registrations are grouped per (root, event type). Each group owns exactly
//! one native listener on the root, attached with the first registration and
//! detached with the last one.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use md_dom::{Document, ListenerId, NodeId, SelectorList};

use super::{Event, EventName};

/// Shared handler
pub type Handler<C> = Rc<dyn Fn(&mut C, &mut Event)>;

/// Handle for one `on`/`one` call (covers every event type it listed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registration<C> {
    id: HandlerId,
    selector: Option<(String, Rc<SelectorList>)>,
    namespaces: Vec<String>,
    handler: Handler<C>,
    once: bool,
}

struct Binding<C> {
    listener: ListenerId,
    registrations: Vec<Registration<C>>,
}

/// Registration copied out for one dispatch
pub(crate) struct Pending<C> {
    pub(crate) id: HandlerId,
    pub(crate) selector: Option<Rc<SelectorList>>,
    pub(crate) handler: Handler<C>,
    pub(crate) once: bool,
}

/// Delegated and direct handler registry for a host `C`
pub struct Delegator<C> {
    bindings: HashMap<(NodeId, String), Binding<C>>,
    owners: HashMap<ListenerId, (NodeId, String)>,
    next_id: u64,
}

impl<C> Default for Delegator<C> {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
            owners: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<C> std::fmt::Debug for Delegator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegator")
            .field("bindings", &self.bindings.len())
            .field("registrations", &self.total_registrations())
            .finish()
    }
}

impl<C> Delegator<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one or more space-separated event names.
    ///
    /// With a selector the handler is delegated: it runs for elements
    /// between the event target and `root` that match the selector at
    /// dispatch time. Without one it runs once per event reaching `root`.
    /// Returns None (and registers nothing) for a dead root, an invalid
    /// selector, or a name list without any event type.
    pub fn on<F>(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        events: &str,
        selector: Option<&str>,
        handler: F,
    ) -> Option<HandlerId>
    where
        F: Fn(&mut C, &mut Event) + 'static,
    {
        self.add(doc, root, events, selector, Rc::new(handler), false)
    }

    /// Like `on`, but the registration is removed before its first invocation
    pub fn one<F>(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        events: &str,
        selector: Option<&str>,
        handler: F,
    ) -> Option<HandlerId>
    where
        F: Fn(&mut C, &mut Event) + 'static,
    {
        self.add(doc, root, events, selector, Rc::new(handler), true)
    }

    fn add(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        events: &str,
        selector: Option<&str>,
        handler: Handler<C>,
        once: bool,
    ) -> Option<HandlerId> {
        if !doc.is_alive(root) {
            tracing::debug!("not registering '{}' on dead node {}", events, root);
            return None;
        }
        let names: Vec<EventName> = EventName::parse_list(events)
            .into_iter()
            .filter(EventName::has_type)
            .collect();
        if names.is_empty() {
            tracing::debug!("no event type in '{}'", events);
            return None;
        }
        let selector = match selector {
            None => None,
            Some(text) => match doc.parse_selector(text) {
                Ok(parsed) => Some((text.to_string(), parsed)),
                Err(err) => {
                    tracing::warn!("delegated handler not registered: {}", err);
                    return None;
                }
            },
        };

        let id = HandlerId(self.next_id);
        self.next_id += 1;

        for name in names {
            let binding = match self.bindings.entry((root, name.event_type.clone())) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let listener = doc.add_event_listener(root, &name.event_type);
                    self.owners.insert(listener, (root, name.event_type.clone()));
                    tracing::trace!("native '{}' listener attached to {}", name.event_type, root);
                    entry.insert(Binding { listener, registrations: Vec::new() })
                }
            };
            binding.registrations.push(Registration {
                id,
                selector: selector.clone(),
                namespaces: name.namespaces,
                handler: Rc::clone(&handler),
                once,
            });
        }
        Some(id)
    }

    /// Remove matching registrations; returns how many were removed.
    ///
    /// `events` may name types, namespaces (`".dialog"`) or both; an empty
    /// string selects every type on `root`. `selector` narrows to
    /// registrations made with that exact selector (`"**"` means any
    /// delegated registration) and `handler` to one `on` call.
    pub fn off(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        events: &str,
        selector: Option<&str>,
        handler: Option<HandlerId>,
    ) -> usize {
        let names = if events.trim().is_empty() {
            vec![EventName { event_type: String::new(), namespaces: Vec::new() }]
        } else {
            EventName::parse_list(events)
        };

        let mut removed = 0;
        for name in &names {
            let keys: Vec<(NodeId, String)> = self
                .bindings
                .keys()
                .filter(|(node, ty)| *node == root && (!name.has_type() || *ty == name.event_type))
                .cloned()
                .collect();
            for key in keys {
                removed += self.remove_where(doc, &key, |reg| {
                    name.selects(&reg.namespaces)
                        && selector.is_none_or(|s| match &reg.selector {
                            Some((text, _)) => s == "**" || text == s,
                            None => false,
                        })
                        && handler.is_none_or(|h| reg.id == h)
                });
            }
        }
        if removed > 0 {
            tracing::trace!("removed {} registrations from {}", removed, root);
        }
        removed
    }

    /// Remove every registration on `root`
    pub fn off_all(&mut self, doc: &mut Document, root: NodeId) -> usize {
        self.off(doc, root, "", None, None)
    }

    pub(crate) fn remove_handler(&mut self, doc: &mut Document, root: NodeId, event_type: &str, id: HandlerId) -> bool {
        let key = (root, event_type.to_string());
        self.remove_where(doc, &key, |reg| reg.id == id) > 0
    }

    fn remove_where(
        &mut self,
        doc: &mut Document,
        key: &(NodeId, String),
        predicate: impl Fn(&Registration<C>) -> bool,
    ) -> usize {
        let Some(binding) = self.bindings.get_mut(key) else {
            return 0;
        };
        let before = binding.registrations.len();
        binding.registrations.retain(|reg| !predicate(reg));
        let removed = before - binding.registrations.len();

        if binding.registrations.is_empty() {
            let listener = binding.listener;
            self.bindings.remove(key);
            self.owners.remove(&listener);
            doc.remove_event_listener(key.0, &key.1, listener);
            tracing::trace!("native '{}' listener detached from {}", key.1, key.0);
        }
        removed
    }

    /// Whether `listener` is a native listener this registry attached
    pub fn owns(&self, listener: ListenerId) -> bool {
        self.owners.contains_key(&listener)
    }

    pub fn is_registered(&self, root: NodeId, event_type: &str, id: HandlerId) -> bool {
        self.bindings
            .get(&(root, event_type.to_string()))
            .is_some_and(|b| b.registrations.iter().any(|r| r.id == id))
    }

    /// Registrations for a (root, type) pair
    pub fn registration_count(&self, root: NodeId, event_type: &str) -> usize {
        self.bindings
            .get(&(root, event_type.to_string()))
            .map(|b| b.registrations.len())
            .unwrap_or(0)
    }

    pub fn total_registrations(&self) -> usize {
        self.bindings.values().map(|b| b.registrations.len()).sum()
    }

    /// Registrations for a (root, type) pair in registration order
    pub(crate) fn snapshot(&self, root: NodeId, event_type: &str) -> Vec<Pending<C>> {
        let Some(binding) = self.bindings.get(&(root, event_type.to_string())) else {
            return Vec::new();
        };
        binding
            .registrations
            .iter()
            .map(|reg| Pending {
                id: reg.id,
                selector: reg.selector.as_ref().map(|(_, parsed)| Rc::clone(parsed)),
                handler: Rc::clone(&reg.handler),
                once: reg.once,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Reg = Delegator<()>;

    fn noop(_: &mut (), _: &mut Event) {}

    #[test]
    fn test_one_native_listener_per_pair() {
        let mut doc = Document::new();
        let root = doc.body();
        let mut reg = Reg::new();

        reg.on(&mut doc, root, "click", Some(".a"), noop).unwrap();
        reg.on(&mut doc, root, "click", Some(".b"), noop).unwrap();
        reg.on(&mut doc, root, "click", None, noop).unwrap();
        assert_eq!(doc.listener_count(root, "click"), 1);
        assert_eq!(reg.registration_count(root, "click"), 3);

        assert_eq!(reg.off(&mut doc, root, "click", None, None), 3);
        assert_eq!(doc.listener_count(root, "click"), 0);
    }

    #[test]
    fn test_multiple_types_share_handler_id() {
        let mut doc = Document::new();
        let root = doc.body();
        let mut reg = Reg::new();

        let id = reg.on(&mut doc, root, "click keydown", None, noop).unwrap();
        assert!(reg.is_registered(root, "click", id));
        assert!(reg.is_registered(root, "keydown", id));
        assert_eq!(reg.off(&mut doc, root, "", None, Some(id)), 2);
        assert_eq!(doc.total_listeners(), 0);
    }

    #[test]
    fn test_namespace_removal_is_scoped() {
        let mut doc = Document::new();
        let root = doc.body();
        let mut reg = Reg::new();

        reg.on(&mut doc, root, "click.dialog keydown.dialog", None, noop).unwrap();
        reg.on(&mut doc, root, "click.menu", None, noop).unwrap();
        reg.on(&mut doc, root, "click", Some("button"), noop).unwrap();

        assert_eq!(reg.off(&mut doc, root, ".dialog", None, None), 2);
        assert_eq!(reg.registration_count(root, "click"), 2);
        assert_eq!(doc.listener_count(root, "keydown"), 0);
        assert_eq!(doc.listener_count(root, "click"), 1);
    }

    #[test]
    fn test_off_by_selector() {
        let mut doc = Document::new();
        let root = doc.body();
        let mut reg = Reg::new();

        reg.on(&mut doc, root, "click", Some(".a"), noop).unwrap();
        reg.on(&mut doc, root, "click", Some(".b"), noop).unwrap();
        reg.on(&mut doc, root, "click", None, noop).unwrap();

        assert_eq!(reg.off(&mut doc, root, "click", Some(".a"), None), 1);
        assert_eq!(reg.off(&mut doc, root, "click", Some("**"), None), 1);
        assert_eq!(reg.registration_count(root, "click"), 1);
    }

    #[test]
    fn test_invalid_registrations_rejected() {
        let mut doc = Document::new();
        let root = doc.body();
        let mut reg = Reg::new();

        assert!(reg.on(&mut doc, root, "click", Some("[oops"), noop).is_none());
        assert!(reg.on(&mut doc, root, ".ns", None, noop).is_none());
        assert!(reg.on(&mut doc, root, "   ", None, noop).is_none());
        assert!(reg.on(&mut doc, NodeId::NONE, "click", None, noop).is_none());
        assert_eq!(doc.total_listeners(), 0);
    }

    #[test]
    fn test_removing_nothing_is_noop() {
        let mut doc = Document::new();
        let root = doc.body();
        let mut reg = Reg::new();
        assert_eq!(reg.off(&mut doc, root, "click", None, None), 0);
        assert_eq!(reg.off_all(&mut doc, root), 0);
    }
}
