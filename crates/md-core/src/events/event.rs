//! Event object
//!
//! One value travels through a whole dispatch; handlers receive it mutably
//! so cancellation and propagation flags are visible to everything after.

use md_dom::NodeId;
use serde_json::Value;

/// Dispatched event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    /// Node the event was dispatched at
    pub target: NodeId,
    /// Node the running handler is attached to, or the matched element for
    /// delegated handlers
    pub current_target: NodeId,
    /// Root the running delegated handler was registered on
    pub delegate_target: NodeId,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Key name for keyboard events (`"Escape"`, `"Tab"`)
    pub key: Option<String>,
    pub shift_key: bool,
    /// Event payload
    pub detail: Value,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_stopped: bool,
}

impl Event {
    /// Bubbling, cancelable event
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: NodeId::NONE,
            delegate_target: NodeId::NONE,
            bubbles: true,
            cancelable: true,
            key: None,
            shift_key: false,
            detail: Value::Null,
            default_prevented: false,
            propagation_stopped: false,
            immediate_stopped: false,
        }
    }

    pub fn click(target: NodeId) -> Self {
        Self::new("click", target)
    }

    pub fn keydown(target: NodeId, key: &str) -> Self {
        Self::new("keydown", target).with_key(key)
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift_key = shift;
        self
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    pub fn is_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }

    /// Cancel the default action; ignored for non-cancelable events
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop the event from reaching outer levels of the path
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation and skip the remaining handlers at this level
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let mut event = Event::click(NodeId::NONE).with_cancelable(false);
        event.prevent_default();
        assert!(!event.is_default_prevented());

        let mut event = Event::click(NodeId::NONE);
        event.prevent_default();
        assert!(event.is_default_prevented());
    }

    #[test]
    fn test_immediate_implies_propagation() {
        let mut event = Event::keydown(NodeId::NONE, "Escape");
        assert!(event.is_key("Escape"));
        event.stop_immediate_propagation();
        assert!(event.is_propagation_stopped());
        assert!(event.is_immediate_propagation_stopped());
    }
}
