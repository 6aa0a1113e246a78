//! End-to-end properties of the runtime
//!
//! Resolution, listener bookkeeping, delegation order, interrupted
//! transitions, scroll lock pairing, Escape routing and canceled opens.

use std::cell::RefCell;
use std::rc::Rc;

use md_runtime::{
    start, Collection, DialogState, Event, NodeId, Runtime, RuntimeConfig, Value,
};

fn page(html: &str) -> Runtime {
    start(html, RuntimeConfig::default()).unwrap()
}

fn id(rt: &Runtime, id: &str) -> NodeId {
    rt.document().get_element_by_id(id).unwrap()
}

/// `count` sibling dialogs, `#d0` .. `#d{count-1}`
fn dialogs_page(count: usize) -> (Runtime, Vec<NodeId>) {
    let mut html = String::from(r#"<main id="main"><button id="start">go</button></main>"#);
    for i in 0..count {
        html.push_str(&format!(
            r#"<div id="d{i}" class="md-dialog"><div class="md-dialog__container"><button>ok</button></div></div>"#
        ));
    }
    let rt = page(&html);
    let roots = (0..count).map(|i| id(&rt, &format!("d{i}"))).collect();
    (rt, roots)
}

/// Deterministic shuffle so close order varies with `seed`
fn shuffled(mut items: Vec<NodeId>, seed: u64) -> Vec<NodeId> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    for i in (1..items.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        items.swap(i, j);
    }
    items
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[test]
fn test_resolve_without_matches_is_empty() {
    let rt = page(r#"<div class="card"></div>"#);
    for selector in [".missing", "#nope", "section > p", "div.card.active", "[data-x]", "li:first-child"] {
        let found = rt.collection(selector);
        assert!(found.is_empty(), "{selector}");
        assert_eq!(found, Collection::empty());
    }
}

#[test]
fn test_invalid_selector_resolves_empty() {
    let rt = page(r#"<div class="card"></div>"#);
    assert!(rt.collection("div[").is_empty());
    assert!(rt.collection("").is_empty());
}

// ============================================================================
// LISTENER BOOKKEEPING
// ============================================================================

#[test]
fn test_one_native_listener_per_root_and_type() {
    let mut rt = page(r#"<ul id="list"><li class="item">a</li></ul>"#);
    let list = id(&rt, "list");
    assert_eq!(rt.document().listener_count(list, "click"), 0);

    let mut handlers = Vec::new();
    for selector in [Some(".item"), None, Some("li"), Some(".item")] {
        handlers.push(rt.on(list, "click.test", selector, |_: &mut Runtime, _: &mut Event| {}).unwrap());
        assert_eq!(rt.document().listener_count(list, "click"), 1);
    }

    for handler in handlers {
        assert_eq!(rt.document().listener_count(list, "click"), 1);
        rt.off(list, "click", Some("**"), Some(handler));
        rt.off(list, "click", None, Some(handler));
    }
    assert_eq!(rt.document().listener_count(list, "click"), 0);

    // Removing again is a no-op
    assert_eq!(rt.off(list, "click", None, None), 0);
}

#[test]
fn test_namespace_removal_keeps_other_registrations() {
    let mut rt = page(r#"<ul id="list"><li class="item">a</li></ul>"#);
    let list = id(&rt, "list");
    rt.on(list, "click.a keydown.a", Some(".item"), |_: &mut Runtime, _: &mut Event| {});
    rt.on(list, "click.b", Some(".item"), |_: &mut Runtime, _: &mut Event| {});

    assert_eq!(rt.off(list, ".a", None, None), 2);
    assert_eq!(rt.document().listener_count(list, "keydown"), 0);
    assert_eq!(rt.document().listener_count(list, "click"), 1);
}

// ============================================================================
// DELEGATION ORDER
// ============================================================================

#[test]
fn test_nearest_delegated_match_fires_first() {
    let mut rt = page(r#"<div id="root"><div id="b"><div id="a"><span id="t">x</span></div></div></div>"#);
    let (root, target) = (id(&rt, "root"), id(&rt, "t"));
    let order = Rc::new(RefCell::new(Vec::new()));

    for (selector, label) in [("#b", "B"), ("#a", "A")] {
        let sink = order.clone();
        rt.on(root, "click", Some(selector), move |_: &mut Runtime, _: &mut Event| {
            sink.borrow_mut().push(label)
        });
    }
    rt.click(target);
    assert_eq!(*order.borrow(), vec!["A", "B"]);
}

#[test]
fn test_handler_for_element_inserted_after_registration() {
    let mut rt = page(r#"<ul id="list"></ul>"#);
    let document = rt.document().root();
    let hits = Rc::new(RefCell::new(0));
    let sink = hits.clone();
    rt.on(document, "click", Some(".item"), move |_: &mut Runtime, _: &mut Event| {
        *sink.borrow_mut() += 1
    });

    let list = id(&rt, "list");
    let inserted = md_runtime::md_html::parse_into(rt.document_mut(), list, r#"<li class="item">new</li>"#).unwrap();
    rt.click(inserted[0]);
    assert_eq!(*hits.borrow(), 1);
}

// ============================================================================
// TRANSITIONS
// ============================================================================

#[test]
fn test_open_then_close_before_settle() {
    for elapsed in [0.0, 16.0, 200.0, 399.0] {
        let (mut rt, roots) = dialogs_page(1);
        let dialog = roots[0];
        rt.open_dialog(dialog);
        rt.tick(elapsed);
        rt.close_dialog(dialog, None);
        rt.settle();

        assert_eq!(rt.dialog_state(dialog), Some(DialogState::Inactive), "after {elapsed}ms");
        assert_eq!(rt.animator().running_count(), 0);
        assert_eq!(rt.overlays().lock_count(), 0);
    }
}

#[test]
fn test_lock_counter_returns_to_zero() {
    for count in 0..6 {
        for seed in 0..4 {
            let (mut rt, roots) = dialogs_page(count);
            for root in &roots {
                assert!(rt.open_dialog(*root));
            }
            assert_eq!(rt.overlays().lock_count(), count);
            if seed % 2 == 0 {
                rt.settle();
            }
            for root in shuffled(roots.clone(), seed) {
                assert!(rt.close_dialog(root, None));
            }
            rt.settle();

            assert_eq!(rt.overlays().lock_count(), 0, "{count} dialogs, seed {seed}");
            assert!(rt.overlays().is_empty());
            assert_eq!(rt.document().style_property(rt.document().body(), "overflow"), None);
        }
    }
}

#[test]
fn test_escape_closes_only_topmost() {
    let (mut rt, roots) = dialogs_page(2);
    let (lower, upper) = (roots[0], roots[1]);
    rt.open_dialog(lower);
    rt.settle();
    rt.open_dialog(upper);
    rt.settle();

    rt.key("Escape", false);
    rt.settle();
    assert_eq!(rt.dialog_state(upper), Some(DialogState::Inactive));
    assert_eq!(rt.dialog_state(lower), Some(DialogState::Active));
    assert_eq!(rt.overlays().lock_count(), 1);
}

#[test]
fn test_canceled_open_notification() {
    let (mut rt, roots) = dialogs_page(1);
    let (dialog, start_button) = (roots[0], id(&rt, "start"));
    rt.document_mut().focus(start_button);
    rt.on(dialog, "open", None, |_: &mut Runtime, event: &mut Event| event.prevent_default());

    assert!(!rt.open_dialog(dialog));
    rt.settle();
    assert_eq!(rt.dialog_state(dialog), Some(DialogState::Inactive));
    assert_eq!(rt.overlays().lock_count(), 0);
    assert_eq!(rt.document().focused(), Some(start_button));
}

// ============================================================================
// DATA AND CAPABILITIES
// ============================================================================

#[test]
fn test_data_store_disposal_through_remove() {
    let mut rt = page(r#"<div id="card"><span id="inner">x</span></div>"#);
    let (card, inner) = (id(&rt, "card"), id(&rt, "inner"));
    rt.data_mut().set(card, "count", 3u32);
    rt.data_mut().set(inner, "label", String::from("x"));
    assert_eq!(rt.data().get::<u32>(card, "count"), Some(&3));

    rt.remove(card);
    assert!(!rt.data().has_entry(card));
    assert!(!rt.data().has_entry(inner));

    // The freed slot gets a new generation
    let fresh = rt.document_mut().create_element("div");
    assert_ne!(fresh, card);
    assert_eq!(rt.data().get::<u32>(fresh, "count"), None);
}

#[test]
fn test_capability_last_writer_wins() {
    let mut rt = page(r#"<p class="x">a</p><p class="x">b</p>"#);
    rt.capabilities_mut()
        .register("count", |_: &mut Runtime, c: &Collection, _: &[Value]| Value::from(c.len()));
    rt.capabilities_mut()
        .register("count", |_: &mut Runtime, c: &Collection, _: &[Value]| Value::from(c.len() * 10));

    let paragraphs = rt.collection("p.x");
    assert_eq!(paragraphs.call(&mut rt, "count", &[]), Some(Value::from(20)));
    assert_eq!(paragraphs.call(&mut rt, "missing", &[]), None);
}
