//! Runtime host
//!
//! `Runtime` owns everything a page needs: the document, the delegation
//! registry, the data store, the capability table, the animator, design
//! tokens and the overlay service. Event handlers and capabilities receive
//! it mutably, so a handler can open a dialog, dispatch further events or
//! start animations directly.
//!
//! Time only moves through `tick`; the host calls it once per frame.

use std::collections::HashSet;

use md_core::{
    dispatch, Capabilities, CapabilityHost, Collection, DataStore, Delegator, Event, EventHost, HandlerId,
    PropertySchema, Target, Value,
};
use md_dom::{Document, NodeId};
use md_motion::{Animator, DesignTokens};

use crate::dialog::{dialog_schema, DialogController, DialogState, Phase, DIALOG_KEY};
use crate::{OverlayService, RuntimeConfig};

/// Length of one frame for `settle`, in milliseconds
pub const FRAME_MS: f64 = 16.0;

/// Upper bound for `settle`
const SETTLE_LIMIT_MS: f64 = 60_000.0;

/// Page runtime
pub struct Runtime {
    pub(crate) document: Document,
    pub(crate) events: Delegator<Runtime>,
    pub(crate) data: DataStore,
    pub(crate) capabilities: Capabilities<Runtime>,
    pub(crate) animator: Animator,
    pub(crate) tokens: DesignTokens,
    pub(crate) overlays: OverlayService,
    pub(crate) config: RuntimeConfig,
    pub(crate) schema: PropertySchema,
    /// Upgraded dialog roots, in upgrade order
    pub(crate) dialogs: Vec<NodeId>,
    now: f64,
    initialized: bool,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("now", &self.now)
            .field("dialogs", &self.dialogs.len())
            .field("overlays", &self.overlays.depth())
            .field("lock_count", &self.overlays.lock_count())
            .field("animations", &self.animator.running_count())
            .field("events", &self.events)
            .finish()
    }
}

impl EventHost for Runtime {
    fn document(&self) -> &Document {
        &self.document
    }

    fn delegator(&self) -> &Delegator<Self> {
        &self.events
    }

    fn event_parts(&mut self) -> (&mut Document, &mut Delegator<Self>) {
        (&mut self.document, &mut self.events)
    }
}

impl CapabilityHost for Runtime {
    fn capabilities(&self) -> &Capabilities<Self> {
        &self.capabilities
    }
}

impl Runtime {
    /// Runtime with the default configuration
    pub fn new(document: Document) -> Self {
        Self::with_config(document, RuntimeConfig::default())
    }

    pub fn with_config(document: Document, config: RuntimeConfig) -> Self {
        let mut tokens = DesignTokens::new();
        config.apply_tokens(&mut tokens);
        let mut runtime = Self {
            document,
            events: Delegator::new(),
            data: DataStore::new(),
            capabilities: Capabilities::new(),
            animator: Animator::new(),
            tokens,
            overlays: OverlayService::new(),
            schema: dialog_schema(&config),
            config,
            dialogs: Vec::new(),
            now: 0.0,
            initialized: false,
        };
        runtime.init();
        runtime
    }

    /// Install the document-level handlers and built-in capabilities.
    ///
    /// Runs once; constructors call it.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.install_keyboard();
        self.install_triggers();
        self.register_capabilities();
        self.initialized = true;
        tracing::debug!(
            "runtime initialized: {} document listeners, capabilities {:?}",
            self.events.total_registrations(),
            self.capabilities.names()
        );
    }

    /// Unwind every overlay without notifications.
    ///
    /// Dialogs stay upgraded and handlers stay installed.
    pub fn reset(&mut self) {
        for root in self.dialogs.clone() {
            let Some(ctrl) = self.controller_mut(root) else {
                continue;
            };
            ctrl.state = DialogState::Inactive;
            ctrl.phase = Phase::Idle;
            ctrl.pending = None;
            let container = ctrl.container;
            self.animator.stop_animations(&mut self.document, container);
            self.update_open(root, false);
            self.document.remove_attr(container, "aria-modal");
        }
        // Outcomes of the stops above belong to dialogs that no longer wait
        self.animator.drain_settled();

        let contexts = self.overlays.reset(&mut self.document);
        if let Some(previous) = contexts.first().and_then(|c| c.previous_focus) {
            self.document.focus(previous);
        }
        tracing::debug!("runtime reset, {} overlays unwound", contexts.len());
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn overlays(&self) -> &OverlayService {
        &self.overlays
    }

    pub fn tokens(&self) -> &DesignTokens {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut DesignTokens {
        &mut self.tokens
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn capabilities_mut(&mut self) -> &mut Capabilities<Runtime> {
        &mut self.capabilities
    }

    /// Current clock, in milliseconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Upgraded dialogs
    pub fn dialogs(&self) -> &[NodeId] {
        &self.dialogs
    }

    pub fn dialog_state(&self, root: NodeId) -> Option<DialogState> {
        self.controller(root).map(|c| c.state)
    }

    pub fn dialog_property(&self, root: NodeId, name: &str) -> Option<Value> {
        self.controller(root)?.props.get(name).cloned()
    }

    /// Return value of the last close
    pub fn return_value(&self, root: NodeId) -> Option<String> {
        self.controller(root)?.return_value.clone()
    }

    pub(crate) fn controller(&self, root: NodeId) -> Option<&DialogController> {
        self.data.get::<DialogController>(root, DIALOG_KEY)
    }

    pub(crate) fn controller_mut(&mut self, root: NodeId) -> Option<&mut DialogController> {
        self.data.get_mut::<DialogController>(root, DIALOG_KEY)
    }

    /// Closest upgraded dialog containing `node`
    pub(crate) fn dialog_for(&self, node: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.document.tree().ancestors(node))
            .find(|n| self.data.has(*n, DIALOG_KEY))
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Resolve a target against the document
    pub fn collection<'a>(&self, target: impl Into<Target<'a>>) -> Collection {
        Collection::resolve(&self.document, target)
    }

    pub fn on<F>(&mut self, root: NodeId, events: &str, selector: Option<&str>, handler: F) -> Option<HandlerId>
    where
        F: Fn(&mut Runtime, &mut Event) + 'static,
    {
        self.events.on(&mut self.document, root, events, selector, handler)
    }

    pub fn one<F>(&mut self, root: NodeId, events: &str, selector: Option<&str>, handler: F) -> Option<HandlerId>
    where
        F: Fn(&mut Runtime, &mut Event) + 'static,
    {
        self.events.one(&mut self.document, root, events, selector, handler)
    }

    pub fn off(&mut self, root: NodeId, events: &str, selector: Option<&str>, handler: Option<HandlerId>) -> usize {
        self.events.off(&mut self.document, root, events, selector, handler)
    }

    pub fn dispatch(&mut self, event: Event) -> Event {
        dispatch(self, event)
    }

    /// Dispatch a click at `node`.
    ///
    /// Inert content does not receive clicks; the event comes back
    /// undispatched.
    pub fn click(&mut self, node: NodeId) -> Event {
        if self.document.is_inert(node) {
            tracing::debug!("click on inert {} ignored", node);
            return Event::click(node);
        }
        dispatch(self, Event::click(node))
    }

    /// Dispatch a keydown at the focused element.
    ///
    /// An unprevented Tab moves focus through the document's tab order.
    pub fn key(&mut self, key: &str, shift: bool) -> Event {
        let target = self.document.active_element();
        let event = dispatch(self, Event::keydown(target, key).with_shift(shift));
        if event.is_key("Tab") && !event.is_default_prevented() {
            let order = self.document.tabbable_within(self.document.root());
            if let Some(next) = crate::keyboard::cycle(&order, self.document.focused(), shift) {
                self.document.focus(next);
            }
        }
        event
    }

    /// Dispatch a notification at a dialog root
    pub(crate) fn emit(&mut self, root: NodeId, event_type: &str, cancelable: bool, detail: Value) -> Event {
        let event = Event::new(event_type, root)
            .with_cancelable(cancelable)
            .with_detail(detail);
        let event = dispatch(self, event);
        if event.is_default_prevented() {
            tracing::debug!("'{}' on {} was canceled", event_type, root);
        }
        event
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Advance the clock by `elapsed` milliseconds.
    ///
    /// Applies animation frames, resolves settled transitions, and moves
    /// focus into dialogs whose open animation finished on an earlier frame.
    pub fn tick(&mut self, elapsed: f64) {
        self.now += elapsed.max(0.0);
        let ready: Vec<NodeId> = self
            .dialogs
            .iter()
            .copied()
            .filter(|root| self.controller(*root).is_some_and(|c| c.phase == Phase::AwaitingFrame))
            .collect();

        let settled = self.animator.tick(&mut self.document, self.now);
        self.route_settled(settled);
        for root in ready {
            self.finish_open(root);
        }
    }

    /// Whether any transition is still in flight
    pub fn is_idle(&self) -> bool {
        self.animator.running_count() == 0
            && self
                .dialogs
                .iter()
                .all(|root| self.controller(*root).is_none_or(|c| c.phase == Phase::Idle))
    }

    /// Tick frames until nothing is in flight; returns the frame count
    pub fn settle(&mut self) -> usize {
        let mut frames = 0;
        while !self.is_idle() {
            if frames as f64 * FRAME_MS > SETTLE_LIMIT_MS {
                tracing::warn!("runtime did not settle within {}ms", SETTLE_LIMIT_MS);
                break;
            }
            self.tick(FRAME_MS);
            frames += 1;
        }
        frames
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove a node and everything the runtime keeps for its subtree.
    ///
    /// Active overlays inside are torn down without notifications; returns
    /// the number of nodes freed.
    pub fn remove(&mut self, node: NodeId) -> usize {
        if !self.document.is_alive(node) {
            return 0;
        }
        let subtree: Vec<NodeId> = std::iter::once(node)
            .chain(self.document.tree().descendants(node))
            .collect();
        let members: HashSet<NodeId> = subtree.iter().copied().collect();

        let doomed: Vec<NodeId> = self.dialogs.iter().copied().filter(|d| members.contains(d)).collect();
        for root in &doomed {
            if let Some(ctrl) = self.data.take::<DialogController>(*root, DIALOG_KEY) {
                tracing::debug!("dialog {} removed while {}", root, ctrl.state);
            }
            let previous = self
                .overlays
                .deactivate(&mut self.document, *root)
                .and_then(|c| c.previous_focus)
                .filter(|p| !members.contains(p));
            if let Some(previous) = previous {
                self.document.focus(previous);
            }
        }
        self.dialogs.retain(|d| !members.contains(d));

        for member in &subtree {
            self.animator.stop_animations(&mut self.document, *member);
            self.events.off_all(&mut self.document, *member);
            self.data.dispose(*member);
        }
        self.process_settled();

        let freed = self.document.dispose(node);
        tracing::debug!("removed {} ({} nodes)", node, freed.len());
        freed.len()
    }
}
