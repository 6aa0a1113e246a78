//! Animator tests for md-motion
//!
//! Token resolution at start time, cancellation and style restoration on a
//! small document.

use md_dom::{Document, NodeId};
use md_motion::{
    AnimationOptions, AnimationOutcome, Animator, DesignTokens, Easing, Keyframe,
};

fn setup() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();
    let scope = doc.create_element("section");
    let card = doc.create_element("div");
    doc.append_child(body, scope).unwrap();
    doc.append_child(scope, card).unwrap();
    (doc, scope, card)
}

fn slide() -> Vec<Keyframe> {
    vec![
        Keyframe::new().with("translate", "0px").with("opacity", "0"),
        Keyframe::new().with("translate", "40px").with("opacity", "1"),
    ]
}

// ============================================================================
// TOKENS
// ============================================================================

#[test]
fn test_scoped_duration_override() {
    let (mut doc, scope, card) = setup();
    doc.set_style_property(scope, "--md-sys-motion-duration-medium2", "100ms");
    let tokens = DesignTokens::new();
    let mut animator = Animator::new();

    let id = animator.animate_to(&mut doc, &tokens, card, slide(), AnimationOptions::default());
    assert!(animator.tick(&mut doc, 99.0).is_empty());
    assert_eq!(animator.tick(&mut doc, 100.0), vec![(id, AnimationOutcome::Completed)]);
}

#[test]
fn test_tokens_resolve_when_animation_starts() {
    let (mut doc, _, card) = setup();
    let mut tokens = DesignTokens::new();
    let mut animator = Animator::new();

    let first = animator.animate_to(&mut doc, &tokens, card, slide(), AnimationOptions::default());
    // Retiming afterwards only affects later animations
    tokens.set_duration("md.sys.motion.duration.medium2", 1000.0);
    animator.tick(&mut doc, 300.0);
    assert!(!animator.is_running(first));

    let second = animator.animate_to(&mut doc, &tokens, card, slide(), AnimationOptions::default());
    animator.tick(&mut doc, 700.0);
    assert!(animator.is_running(second));
}

#[test]
fn test_easing_token_shapes_progress() {
    let (mut doc, _, card) = setup();
    let mut tokens = DesignTokens::new();
    tokens.set_easing("md.sys.motion.easing.standard", Easing::Steps(2, Default::default()));
    let mut animator = Animator::new();

    animator.animate_to(&mut doc, &tokens, card, slide(), AnimationOptions::default());
    animator.tick(&mut doc, 100.0);
    assert_eq!(doc.style_property(card, "translate"), Some("0px".into()));
    animator.tick(&mut doc, 200.0);
    assert_eq!(doc.style_property(card, "translate"), Some("20px".into()));
}

// ============================================================================
// CANCELLATION
// ============================================================================

#[test]
fn test_stop_then_start_conflicting_animation() {
    let (mut doc, _, card) = setup();
    let tokens = DesignTokens::new();
    let mut animator = Animator::new();

    let opening = animator.animate_to(&mut doc, &tokens, card, slide(), AnimationOptions::default());
    animator.tick(&mut doc, 150.0);
    assert_eq!(animator.stop_animations(&mut doc, card), vec![opening]);
    assert_eq!(doc.style_property(card, "translate"), None);

    let closing = animator.animate_to(&mut doc, &tokens, card, slide(), AnimationOptions::millis(50.0, Easing::Linear));
    assert_eq!(animator.running_on(card), vec![closing]);
    let settled = animator.tick(&mut doc, 200.0);
    assert_eq!(
        settled,
        vec![(opening, AnimationOutcome::Canceled), (closing, AnimationOutcome::Completed)]
    );
}

#[test]
fn test_dispose_cancels() {
    let (mut doc, scope, card) = setup();
    let tokens = DesignTokens::new();
    let mut animator = Animator::new();

    let id = animator.animate_to(&mut doc, &tokens, card, slide(), AnimationOptions::default());
    doc.dispose(scope);
    assert_eq!(animator.tick(&mut doc, 16.0), vec![(id, AnimationOutcome::Canceled)]);
    assert_eq!(animator.running_count(), 0);
}

#[test]
fn test_cancel_all_restores_every_node() {
    let (mut doc, scope, card) = setup();
    doc.set_style_property(scope, "opacity", "0.5");
    let tokens = DesignTokens::new();
    let mut animator = Animator::new();

    animator.animate_to(&mut doc, &tokens, scope, slide(), AnimationOptions::default());
    animator.animate_to(&mut doc, &tokens, card, slide(), AnimationOptions::default());
    animator.tick(&mut doc, 100.0);
    animator.cancel_all(&mut doc);

    assert_eq!(animator.running_count(), 0);
    assert_eq!(doc.style_property(scope, "opacity"), Some("0.5".into()));
    assert_eq!(doc.style_property(card, "opacity"), None);
    assert_eq!(animator.drain_settled().len(), 2);
}
