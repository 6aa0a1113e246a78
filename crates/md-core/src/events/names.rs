//! Event name parsing
//!
//! `"click.dialog.md keydown"` lists two registrations: `click` in the
//! namespaces `dialog` and `md`, and plain `keydown`. A name without a type
//! (`".dialog"`) only makes sense for removal.

/// One parsed event name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventName {
    /// Event type; empty for namespace-only names
    pub event_type: String,
    pub namespaces: Vec<String>,
}

impl EventName {
    /// Parse a single name such as `click.dialog`
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.trim().split('.');
        let event_type = parts.next()?.to_string();
        let mut namespaces: Vec<String> = parts
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        namespaces.sort();
        namespaces.dedup();
        if event_type.is_empty() && namespaces.is_empty() {
            return None;
        }
        Some(Self { event_type, namespaces })
    }

    /// Parse a space-separated list of names
    pub fn parse_list(names: &str) -> Vec<Self> {
        names.split_ascii_whitespace().filter_map(Self::parse).collect()
    }

    pub fn has_type(&self) -> bool {
        !self.event_type.is_empty()
    }

    /// Whether a registration carrying `namespaces` is selected by this name.
    /// Every namespace named here must be present on the registration.
    pub fn selects(&self, namespaces: &[String]) -> bool {
        self.namespaces.iter().all(|ns| namespaces.contains(ns))
    }
}
