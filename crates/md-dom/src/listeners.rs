//! Native listener table
//!
//! The platform-level `addEventListener` bookkeeping: which listener ids are
//! attached to which (node, event type) pair, in attachment order. What a
//! listener does is up to whoever owns the id.

use std::collections::HashMap;

use crate::NodeId;

/// Native listener identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Listener storage keyed by (node, event type)
#[derive(Debug, Default)]
pub struct NativeListeners {
    listeners: HashMap<(NodeId, String), Vec<ListenerId>>,
    next_id: u64,
}

impl NativeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new listener and return its id
    pub fn add(&mut self, node: NodeId, event_type: &str) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry((node, event_type.to_string()))
            .or_default()
            .push(id);
        id
    }

    /// Detach a listener; returns false if it was not attached
    pub fn remove(&mut self, node: NodeId, event_type: &str, id: ListenerId) -> bool {
        let key = (node, event_type.to_string());
        let Some(list) = self.listeners.get_mut(&key) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| *l == id) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.listeners.remove(&key);
        }
        true
    }

    /// Listeners for a node and event type, in attachment order
    pub fn get(&self, node: NodeId, event_type: &str) -> &[ListenerId] {
        self.listeners
            .get(&(node, event_type.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of listeners for a node and event type
    pub fn count(&self, node: NodeId, event_type: &str) -> usize {
        self.get(node, event_type).len()
    }

    /// Drop every listener attached to a node
    pub fn clear_node(&mut self, node: NodeId) -> usize {
        let before = self.total();
        self.listeners.retain(|(n, _), _| *n != node);
        before - self.total()
    }

    /// Total attached listeners
    pub fn total(&self) -> usize {
        self.listeners.values().map(|v| v.len()).sum()
    }
}
