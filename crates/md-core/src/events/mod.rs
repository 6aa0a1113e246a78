//! Events and delegation
//!
//! `dispatch` walks the propagation path from the target up to the
//! document. At each node it runs that node's native listeners in
//! attachment order; a listener owned by the `Delegator` runs the
//! delegated handlers of that root (matched element closest to the target
//! first), then the root's direct handlers.

mod delegate;
mod event;
mod names;

pub use delegate::{Delegator, Handler, HandlerId};
pub use event::Event;
pub use names::EventName;

use md_dom::{Document, NodeId};

use delegate::Pending;

/// State a dispatch needs from its host
pub trait EventHost: Sized + 'static {
    fn document(&self) -> &Document;

    fn delegator(&self) -> &Delegator<Self>;

    /// Split borrow of the document and the registry
    fn event_parts(&mut self) -> (&mut Document, &mut Delegator<Self>);
}

/// Dispatch an event and return it with its final flags
pub fn dispatch<C: EventHost>(host: &mut C, mut event: Event) -> Event {
    let mut path = host.document().event_path(event.target);
    if path.is_empty() {
        tracing::debug!("'{}' dispatched at dead node {}", event.event_type, event.target);
        return event;
    }
    if !event.bubbles {
        path.truncate(1);
    }

    for node in path {
        let listeners = host.document().listeners_for(node, &event.event_type).to_vec();
        for listener in listeners {
            // A handler earlier in this loop may have detached it
            let attached = host
                .document()
                .listeners_for(node, &event.event_type)
                .contains(&listener);
            if attached && host.delegator().owns(listener) {
                run_delegation(host, node, &mut event);
            }
            if event.is_immediate_propagation_stopped() {
                break;
            }
        }
        if event.is_propagation_stopped() {
            break;
        }
    }

    event.current_target = NodeId::NONE;
    event.delegate_target = NodeId::NONE;
    event
}

fn run_delegation<C: EventHost>(host: &mut C, root: NodeId, event: &mut Event) {
    let (delegated, direct): (Vec<Pending<C>>, Vec<Pending<C>>) = host
        .delegator()
        .snapshot(root, &event.event_type)
        .into_iter()
        .partition(|p| p.selector.is_some());

    // Matching happens here, against the tree as it is when the event fires
    let mut levels: Vec<(NodeId, Vec<&Pending<C>>)> = Vec::new();
    if !delegated.is_empty() {
        let doc = host.document();
        let mut cursor = Some(event.target);
        while let Some(node) = cursor {
            if node == root {
                break;
            }
            let matched: Vec<&Pending<C>> = delegated
                .iter()
                .filter(|p| p.selector.as_ref().is_some_and(|s| doc.matches(node, s)))
                .collect();
            if !matched.is_empty() {
                levels.push((node, matched));
            }
            cursor = doc.tree().parent(node);
        }
    }

    for (node, handlers) in levels {
        event.current_target = node;
        event.delegate_target = root;
        invoke(host, root, &handlers, event);
        if event.is_propagation_stopped() {
            return;
        }
    }

    event.current_target = root;
    event.delegate_target = root;
    let direct: Vec<&Pending<C>> = direct.iter().collect();
    invoke(host, root, &direct, event);
}

fn invoke<C: EventHost>(host: &mut C, root: NodeId, handlers: &[&Pending<C>], event: &mut Event) {
    for pending in handlers {
        // Removed by an earlier handler of this dispatch
        if !host.delegator().is_registered(root, &event.event_type, pending.id) {
            continue;
        }
        if pending.once {
            let (doc, delegator) = host.event_parts();
            delegator.remove_handler(doc, root, &event.event_type, pending.id);
        }
        (pending.handler)(host, event);
        if event.is_immediate_propagation_stopped() {
            break;
        }
    }
}
