//! Keyboard routing for overlays
//!
//! One document-level `keydown` registration: Escape closes the topmost
//! overlay when it allows it, Tab and Shift+Tab cycle focus inside the
//! topmost overlay.

use md_core::Event;
use md_dom::NodeId;

use crate::dialog::DialogState;
use crate::Runtime;

/// Next entry of a tab order, wrapping at both ends.
///
/// From outside the order, forward starts at the first entry and backward
/// at the last.
pub(crate) fn cycle(order: &[NodeId], current: Option<NodeId>, backwards: bool) -> Option<NodeId> {
    let count = order.len();
    if count == 0 {
        return None;
    }
    let position = current.and_then(|c| order.iter().position(|n| *n == c));
    let next = match (position, backwards) {
        (Some(i), false) => (i + 1) % count,
        (Some(i), true) => (i + count - 1) % count,
        (None, false) => 0,
        (None, true) => count - 1,
    };
    Some(order[next])
}

impl Runtime {
    pub(crate) fn install_keyboard(&mut self) {
        let document = self.document.root();
        self.events.on(
            &mut self.document,
            document,
            "keydown.md-overlay",
            None,
            |rt: &mut Runtime, event: &mut Event| rt.handle_keydown(event),
        );
    }

    fn handle_keydown(&mut self, event: &mut Event) {
        if event.is_default_prevented() {
            return;
        }
        let Some(top) = self.overlays.top().map(|c| c.root) else {
            return;
        };

        if event.is_key("Escape") {
            let enabled = self.controller(top).is_some_and(|c| {
                c.props.get_bool("closeOnEscape") && matches!(c.state, DialogState::Opening | DialogState::Active)
            });
            if enabled {
                event.prevent_default();
                self.close_dialog(top, None);
            }
        } else if event.is_key("Tab") {
            event.prevent_default();
            self.trap_focus(top, event.shift_key);
        }
    }

    /// Move focus to the next tabbable element inside the overlay at `root`.
    ///
    /// Without tabbable content the focus stays on the dialog container.
    pub fn trap_focus(&mut self, root: NodeId, backwards: bool) -> Option<NodeId> {
        let container = self.controller(root).map(|c| c.container).unwrap_or(root);
        let order = self.document.tabbable_within(container);
        let target = cycle(&order, self.document.focused(), backwards).unwrap_or(container);
        if self.document.focus(target) {
            Some(target)
        } else {
            tracing::debug!("focus trap in {} could not focus {}", root, target);
            None
        }
    }
}
