//! Capability registry
//!
//! Named operations that any `Collection` can invoke through
//! `Collection::call`. Modules register their operations independently;
//! registering a name that already exists replaces the previous operation.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::Collection;

/// A registered operation: receives the host, the collection it was called
/// on, and the call arguments
pub type Capability<C> = Rc<dyn Fn(&mut C, &Collection, &[Value]) -> Value>;

/// Hosts that own a capability table
pub trait CapabilityHost: Sized + 'static {
    fn capabilities(&self) -> &Capabilities<Self>;
}

/// Name → operation table
pub struct Capabilities<C> {
    table: HashMap<String, Capability<C>>,
}

impl<C> Default for Capabilities<C> {
    fn default() -> Self {
        Self { table: HashMap::new() }
    }
}

impl<C> std::fmt::Debug for Capabilities<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").field("names", &self.names()).finish()
    }
}

impl<C> Capabilities<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation; returns true if it replaced an existing one
    pub fn register<F>(&mut self, name: &str, operation: F) -> bool
    where
        F: Fn(&mut C, &Collection, &[Value]) -> Value + 'static,
    {
        self.insert(name, Rc::new(operation))
    }

    fn insert(&mut self, name: &str, operation: Capability<C>) -> bool {
        let replaced = self.table.insert(name.to_string(), operation).is_some();
        if replaced {
            tracing::debug!("capability '{}' replaced", name);
        }
        replaced
    }

    /// Register several operations at once, in iteration order
    pub fn extend<I>(&mut self, operations: I)
    where
        I: IntoIterator<Item = (String, Capability<C>)>,
    {
        for (name, operation) in operations {
            self.insert(&name, operation);
        }
    }

    pub fn get(&self, name: &str) -> Option<Capability<C>> {
        self.table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.table.remove(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
