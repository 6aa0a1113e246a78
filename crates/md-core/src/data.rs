//! Node Data Store
//!
//! Side table of keyed values per node. Entries are keyed by the node's
//! generational id, created lazily on first write and removed only by an
//! explicit `dispose`; nothing here watches the tree.

use std::any::Any;
use std::collections::HashMap;

use md_dom::NodeId;

/// Per-node keyed storage
#[derive(Default)]
pub struct DataStore {
    entries: HashMap<NodeId, HashMap<String, Box<dyn Any>>>,
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("nodes", &self.entries.len())
            .field("values", &self.value_count())
            .finish()
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning true if it replaced an existing one
    pub fn set<T: Any>(&mut self, node: NodeId, key: &str, value: T) -> bool {
        if !node.is_valid() {
            return false;
        }
        self.entries
            .entry(node)
            .or_default()
            .insert(key.to_string(), Box::new(value))
            .is_some()
    }

    /// Typed read; None when missing or stored with another type
    pub fn get<T: Any>(&self, node: NodeId, key: &str) -> Option<&T> {
        self.entries.get(&node)?.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, node: NodeId, key: &str) -> Option<&mut T> {
        self.entries.get_mut(&node)?.get_mut(key)?.downcast_mut()
    }

    /// Move a value out of the store. A value of another type is left in place.
    pub fn take<T: Any>(&mut self, node: NodeId, key: &str) -> Option<T> {
        let values = self.entries.get_mut(&node)?;
        if !values.get(key)?.is::<T>() {
            return None;
        }
        let value = values.remove(key)?;
        value.downcast::<T>().ok().map(|b| *b)
    }

    pub fn has(&self, node: NodeId, key: &str) -> bool {
        self.entries.get(&node).is_some_and(|v| v.contains_key(key))
    }

    /// Remove one key; the node's entry itself stays until disposal
    pub fn remove(&mut self, node: NodeId, key: &str) -> bool {
        self.entries
            .get_mut(&node)
            .is_some_and(|v| v.remove(key).is_some())
    }

    /// Drop the node's whole entry, returning how many values it held
    pub fn dispose(&mut self, node: NodeId) -> usize {
        let dropped = self.entries.remove(&node).map(|v| v.len()).unwrap_or(0);
        if dropped > 0 {
            tracing::trace!("data store dropped {} values for {}", dropped, node);
        }
        dropped
    }

    /// Whether the node has an entry (possibly empty)
    pub fn has_entry(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    /// Keys stored for a node, sorted
    pub fn keys(&self, node: NodeId) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .entries
            .get(&node)
            .map(|v| v.keys().map(String::as_str).collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }

    /// Nodes holding an entry
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn value_count(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
