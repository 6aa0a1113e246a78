//! Dialog transitions
//!
//! `inactive → opening → active → closing → inactive`, one transition in
//! flight per dialog. A request that arrives while an animation runs is
//! stored as the pending intent, the animation is stopped, and the intent
//! is re-evaluated once the cancellation has settled. Because stopping is
//! synchronous, that all happens before the request returns.

use md_core::schema::coerce;
use md_core::{Options, PropertyChange, PropertyKind, Value};
use md_motion::{AnimationId, AnimationOutcome};
use md_dom::NodeId;
use serde_json::json;

use crate::dialog::{
    close_keyframes, close_timing, open_keyframes, open_timing, DialogController, DialogState, Intent, Phase,
    CONTAINER_SELECTOR, DIALOG_KEY, STACKED_CLASS,
};
use crate::Runtime;

impl Runtime {
    /// Attach a dialog controller to `root`; returns false for non-elements.
    ///
    /// Reuses the existing controller on later calls. A root that already
    /// carries the `open` attribute starts opening immediately.
    pub fn upgrade_dialog(&mut self, root: NodeId) -> bool {
        let Some(start_open) = self.upgrade(root) else {
            return false;
        };
        if start_open {
            self.open_dialog(root);
        }
        true
    }

    /// Upgrade and apply declarative options (`open` is ignored)
    pub fn upgrade_with_options(&mut self, root: NodeId, options: &Options) -> bool {
        let Some(start_open) = self.upgrade(root) else {
            return false;
        };
        self.apply_options(root, options);
        if start_open {
            self.open_dialog(root);
        }
        true
    }

    /// Apply declarative options, then request the dialog to open
    pub(crate) fn open_with_options(&mut self, root: NodeId, options: &Options) -> bool {
        if self.upgrade(root).is_none() {
            return false;
        }
        self.apply_options(root, options);
        self.open_dialog(root)
    }

    /// Create the controller without opening anything.
    ///
    /// None for non-elements; otherwise whether a fresh upgrade found the
    /// `open` attribute (which it clears).
    fn upgrade(&mut self, root: NodeId) -> Option<bool> {
        if self.data.has(root, DIALOG_KEY) {
            return Some(false);
        }
        if !self.document.is_element(root) {
            tracing::debug!("cannot upgrade {} to a dialog", root);
            return None;
        }

        let mut props = self.schema.from_attributes(&self.document, root);
        let container = self
            .document
            .query_selector(root, CONTAINER_SELECTOR)
            .ok()
            .flatten()
            .unwrap_or(root);
        if !self.document.has_attr(container, "tabindex") {
            if let Err(err) = self.document.set_attr(container, "tabindex", "-1") {
                tracing::warn!("dialog container {} not focusable: {}", container, err);
            }
        }
        self.document
            .toggle_class(root, STACKED_CLASS, Some(props.get_bool("stacked")));

        let start_open = props.get_bool("open");
        if start_open {
            self.schema
                .update(&mut self.document, root, &mut props, "open", Value::Bool(false));
        }
        self.data.set(root, DIALOG_KEY, DialogController::new(props, container));
        self.dialogs.push(root);
        tracing::debug!("dialog {} upgraded (container {})", root, container);
        Some(start_open)
    }

    fn apply_options(&mut self, root: NodeId, options: &Options) {
        let mut options = options.clone();
        options.remove("open");

        let Some(ctrl) = self.data.get_mut::<DialogController>(root, DIALOG_KEY) else {
            return;
        };
        let changes = self
            .schema
            .apply_options(&mut self.document, root, &mut ctrl.props, &options);
        for change in &changes {
            self.apply_change(root, change);
        }
    }

    /// Set one dialog property; `open` routes to `open_dialog` / `close_dialog`.
    ///
    /// An explicit `open` value takes precedence over the `open` attribute
    /// found on upgrade.
    pub fn set_dialog_property(&mut self, root: NodeId, name: &str, value: Value) -> bool {
        let Some(start_open) = self.upgrade(root) else {
            return false;
        };
        if name == "open" {
            return match coerce(PropertyKind::Boolean, &value).and_then(|v| v.as_bool()) {
                Some(true) => self.open_dialog(root),
                Some(false) => self.close_dialog(root, None),
                None => false,
            };
        }

        let Some(ctrl) = self.data.get_mut::<DialogController>(root, DIALOG_KEY) else {
            return false;
        };
        let change = self
            .schema
            .update(&mut self.document, root, &mut ctrl.props, name, value);
        if let Some(change) = &change {
            self.apply_change(root, change);
        }
        if start_open {
            self.open_dialog(root);
        }
        change.is_some()
    }

    fn apply_change(&mut self, root: NodeId, change: &PropertyChange) {
        tracing::trace!("dialog {} property {}: {} -> {}", root, change.name, change.old, change.new);
        if change.name == "stacked" {
            let stacked = change.new.as_bool().unwrap_or(false);
            self.document.toggle_class(root, STACKED_CLASS, Some(stacked));
        }
    }

    pub(crate) fn update_open(&mut self, root: NodeId, open: bool) {
        let Some(ctrl) = self.data.get_mut::<DialogController>(root, DIALOG_KEY) else {
            return;
        };
        self.schema
            .update(&mut self.document, root, &mut ctrl.props, "open", Value::Bool(open));
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Request the dialog to open.
    ///
    /// Returns false when the dialog is already opening or active, or when
    /// the `open` notification was canceled.
    pub fn open_dialog(&mut self, root: NodeId) -> bool {
        if self.upgrade(root).is_none() {
            return false;
        }
        let Some(ctrl) = self.controller_mut(root) else {
            return false;
        };
        match ctrl.state {
            DialogState::Inactive => self.begin_open(root),
            DialogState::Closing => {
                ctrl.pending = Some(Intent::Open);
                let container = ctrl.container;
                self.interrupt(container);
                matches!(
                    self.dialog_state(root),
                    Some(DialogState::Opening | DialogState::Active)
                )
            }
            DialogState::Opening | DialogState::Active => {
                tracing::debug!("dialog {} is already {}", root, ctrl.state);
                false
            }
        }
    }

    /// Request the dialog to close with an optional return value.
    ///
    /// Returns false when it is not open or the `close` notification was
    /// canceled.
    pub fn close_dialog(&mut self, root: NodeId, return_value: Option<String>) -> bool {
        let Some(ctrl) = self.controller_mut(root) else {
            return false;
        };
        match ctrl.state {
            DialogState::Active => self.begin_close(root, return_value),
            DialogState::Opening => {
                ctrl.pending = Some(Intent::Close(return_value));
                if ctrl.animation().is_some() {
                    let container = ctrl.container;
                    self.interrupt(container);
                } else {
                    ctrl.phase = Phase::Idle;
                    self.resolve_pending(root);
                }
                matches!(
                    self.dialog_state(root),
                    Some(DialogState::Closing | DialogState::Inactive)
                )
            }
            DialogState::Inactive | DialogState::Closing => false,
        }
    }

    /// Stop the animations on `node` and resolve what that settles
    fn interrupt(&mut self, node: NodeId) {
        self.animator.stop_animations(&mut self.document, node);
        self.process_settled();
    }

    // ========================================================================
    // Steps
    // ========================================================================

    fn begin_open(&mut self, root: NodeId) -> bool {
        let notice = self.emit(root, "open", true, Value::Null);
        if notice.is_default_prevented() {
            return false;
        }
        // Handlers may have changed the dialog meanwhile
        let Some(ctrl) = self.controller(root) else {
            return false;
        };
        if ctrl.state != DialogState::Inactive || !self.document.is_connected(root) {
            return false;
        }
        let (container, lock) = (ctrl.container, ctrl.props.get_bool("lockScroll"));

        let previous_focus = self.document.focused();
        if self
            .overlays
            .activate(&mut self.document, root, previous_focus, lock)
            .is_none()
        {
            return false;
        }
        self.update_open(root, true);
        let mut marks = vec![("aria-modal", "true")];
        if !self.document.has_attr(container, "role") {
            marks.push(("role", "dialog"));
        }
        for (name, value) in marks {
            if let Err(err) = self.document.set_attr(container, name, value) {
                tracing::warn!("cannot set {} on dialog container {}: {}", name, container, err);
            }
        }

        if let Some(ctrl) = self.controller_mut(root) {
            ctrl.state = DialogState::Opening;
            ctrl.return_value = None;
        }
        tracing::debug!("dialog {}: inactive -> opening", root);

        let id = self
            .animator
            .animate_to(&mut self.document, &self.tokens, container, open_keyframes(), open_timing());
        self.await_animation(root, id);
        true
    }

    fn begin_close(&mut self, root: NodeId, return_value: Option<String>) -> bool {
        let notice = self.emit(root, "close", true, json!({ "returnValue": &return_value }));
        let Some(ctrl) = self.controller_mut(root) else {
            return false;
        };
        if notice.is_default_prevented() {
            // An interrupted open still has to finish
            if ctrl.state == DialogState::Opening && ctrl.phase == Phase::Idle {
                ctrl.phase = Phase::AwaitingFrame;
            }
            return false;
        }
        let from = ctrl.state;
        if !matches!(from, DialogState::Opening | DialogState::Active) {
            return false;
        }
        ctrl.state = DialogState::Closing;
        ctrl.return_value = return_value;
        let container = ctrl.container;
        self.update_open(root, false);
        tracing::debug!("dialog {}: {} -> closing", root, from);

        let id = self
            .animator
            .animate_to(&mut self.document, &self.tokens, container, close_keyframes(), close_timing());
        self.await_animation(root, id);
        true
    }

    fn await_animation(&mut self, root: NodeId, id: AnimationId) {
        if let Some(ctrl) = self.controller_mut(root) {
            ctrl.phase = Phase::Animating(id);
        }
        // Zero durations and detached containers settle immediately
        self.process_settled();
    }

    /// Move focus in and report `opened`
    pub(crate) fn finish_open(&mut self, root: NodeId) {
        let Some(ctrl) = self.controller_mut(root) else {
            return;
        };
        if ctrl.state != DialogState::Opening || ctrl.phase != Phase::AwaitingFrame {
            return;
        }
        ctrl.phase = Phase::Idle;
        ctrl.state = DialogState::Active;
        let container = ctrl.container;

        let autofocus = self
            .document
            .query_selector_all(root, "[autofocus]")
            .unwrap_or_default()
            .into_iter()
            .find(|n| self.document.is_focusable(*n));
        let focused = match autofocus {
            Some(target) => self.document.focus(target),
            None => self.document.focus(container),
        };
        if !focused {
            tracing::debug!("dialog {} could not take focus", root);
        }

        tracing::debug!("dialog {}: opening -> active", root);
        self.emit(root, "opened", false, Value::Null);
    }

    /// Pop the overlay, restore focus and report `closed`
    fn finish_close(&mut self, root: NodeId) {
        let Some(ctrl) = self.controller_mut(root) else {
            return;
        };
        let from = ctrl.state;
        ctrl.state = DialogState::Inactive;
        ctrl.phase = Phase::Idle;
        let container = ctrl.container;
        let return_value = ctrl.return_value.clone();

        let focus_inside = self
            .document
            .focused()
            .is_some_and(|f| self.document.tree().contains(root, f));
        let context = self.overlays.deactivate(&mut self.document, root);
        self.update_open(root, false);
        self.document.remove_attr(container, "aria-modal");

        let restored = context
            .and_then(|c| c.previous_focus)
            .is_some_and(|previous| self.document.focus(previous));
        if !restored && focus_inside {
            self.document.blur();
        }

        tracing::debug!("dialog {}: {} -> inactive", root, from);
        self.emit(root, "closed", false, json!({ "returnValue": &return_value }));
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Route everything the animator settled since the last drain
    pub(crate) fn process_settled(&mut self) {
        let settled = self.animator.drain_settled();
        self.route_settled(settled);
    }

    pub(crate) fn route_settled(&mut self, settled: Vec<(AnimationId, AnimationOutcome)>) {
        for (id, outcome) in settled {
            let owner = self
                .dialogs
                .iter()
                .copied()
                .find(|root| self.controller(*root).and_then(DialogController::animation) == Some(id));
            if let Some(root) = owner {
                self.on_settled(root, outcome);
            }
        }
    }

    fn on_settled(&mut self, root: NodeId, outcome: AnimationOutcome) {
        let connected = self.document.is_connected(root);
        let Some(ctrl) = self.controller_mut(root) else {
            return;
        };
        ctrl.phase = Phase::Idle;
        tracing::trace!("dialog {} animation settled: {:?}", root, outcome);

        match ctrl.state {
            DialogState::Opening => {
                if ctrl.pending.is_some() {
                    self.resolve_pending(root);
                } else if outcome == AnimationOutcome::Canceled && !connected {
                    self.finish_close(root);
                } else {
                    ctrl.phase = Phase::AwaitingFrame;
                }
            }
            DialogState::Closing => {
                self.finish_close(root);
                self.resolve_pending(root);
            }
            DialogState::Inactive | DialogState::Active => {}
        }
    }

    /// Re-evaluate a queued request against the current state
    fn resolve_pending(&mut self, root: NodeId) {
        let Some(ctrl) = self.controller_mut(root) else {
            return;
        };
        let Some(intent) = ctrl.pending.take() else {
            return;
        };
        match (ctrl.state, intent) {
            (DialogState::Opening, Intent::Close(value)) => {
                self.begin_close(root, value);
            }
            (DialogState::Inactive, Intent::Open) => {
                self.begin_open(root);
            }
            (state, intent) => {
                tracing::debug!("dialog {}: dropping queued {:?} while {}", root, intent, state);
            }
        }
    }
}
