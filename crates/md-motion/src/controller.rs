//! Animation controller
//!
//! Animations are driven by `tick`, which the host calls with its clock.
//! Every animation settles exactly once with an `AnimationOutcome`;
//! settlements are queued and handed out by `tick` / `drain_settled`.
//! Cancellation is synchronous: once `stop_animations` returns, nothing is
//! running on the node and its inline styles are back to their
//! pre-animation values.

use md_dom::{Document, NodeId};

use crate::animation::Animation;
use crate::{AnimationId, AnimationOptions, AnimationOutcome, DesignTokens, DurationSpec, EasingSpec, Keyframe};

/// Animation manager
#[derive(Debug, Default)]
pub struct Animator {
    running: Vec<Animation>,
    settled: Vec<(AnimationId, AnimationOutcome)>,
    next_id: u64,
    now: f64,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock value of the last tick
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Start animating `node` through `keyframes`.
    ///
    /// Running animations on the same node that touch any of the same
    /// properties settle as `Superseded`. A zero duration applies the final
    /// frame and completes immediately; a dead or disconnected node cancels
    /// immediately.
    pub fn animate_to(
        &mut self,
        doc: &mut Document,
        tokens: &DesignTokens,
        node: NodeId,
        keyframes: Vec<Keyframe>,
        options: AnimationOptions,
    ) -> AnimationId {
        self.next_id += 1;
        let id = AnimationId(self.next_id);

        if !doc.is_connected(node) {
            tracing::debug!("animation {:?} canceled: {} is not in the document", id, node);
            self.settled.push((id, AnimationOutcome::Canceled));
            return id;
        }

        let duration = match &options.duration {
            DurationSpec::Millis(ms) => ms.max(0.0),
            DurationSpec::Token(name) => tokens.duration(doc, node, name),
        };
        let easing = match &options.easing {
            EasingSpec::Curve(easing) => *easing,
            EasingSpec::Token(name) => tokens.easing(doc, node, name),
        };

        let mut animation = Animation {
            id,
            target: node,
            keyframes,
            duration,
            easing,
            start_time: self.now,
            saved: Vec::new(),
        };
        let properties = animation.properties();

        // Supersede overlapping animations, inheriting their saved values
        let mut index = 0;
        while index < self.running.len() {
            let other = &self.running[index];
            let overlaps = other.target == node && other.properties().iter().any(|p| properties.contains(p));
            if !overlaps {
                index += 1;
                continue;
            }
            let old = self.running.remove(index);
            for (property, value) in old.saved {
                if properties.contains(&property) {
                    animation.saved.push((property, value));
                } else {
                    restore(doc, old.target, &property, value.as_deref());
                }
            }
            tracing::trace!("animation {:?} superseded by {:?}", old.id, id);
            self.settled.push((old.id, AnimationOutcome::Superseded));
        }

        for property in &properties {
            if !animation.saved.iter().any(|(p, _)| p == property) {
                animation.saved.push((property.clone(), doc.style_property(node, property)));
            }
        }

        tracing::debug!("animation {:?} on {}: {}ms {}", id, node, duration, easing);
        if duration <= 0.0 {
            self.settle(doc, animation, AnimationOutcome::Completed);
        } else {
            apply(doc, &animation, 0.0);
            self.running.push(animation);
        }
        id
    }

    /// Cancel everything running on `node`; returns the canceled ids
    pub fn stop_animations(&mut self, doc: &mut Document, node: NodeId) -> Vec<AnimationId> {
        let mut stopped = Vec::new();
        // Newest first so the oldest saved values are restored last
        while let Some(pos) = self.running.iter().rposition(|a| a.target == node) {
            let animation = self.running.remove(pos);
            stopped.push(animation.id);
            self.settle(doc, animation, AnimationOutcome::Canceled);
        }
        if !stopped.is_empty() {
            tracing::debug!("stopped {} animations on {}", stopped.len(), node);
        }
        stopped
    }

    /// Cancel everything
    pub fn cancel_all(&mut self, doc: &mut Document) {
        while let Some(animation) = self.running.pop() {
            self.settle(doc, animation, AnimationOutcome::Canceled);
        }
    }

    /// Advance the clock, apply frames and return everything that settled
    /// since the previous drain
    pub fn tick(&mut self, doc: &mut Document, now: f64) -> Vec<(AnimationId, AnimationOutcome)> {
        self.now = self.now.max(now);

        let mut index = 0;
        while index < self.running.len() {
            let animation = &self.running[index];
            if !doc.is_connected(animation.target) {
                let animation = self.running.remove(index);
                self.settle(doc, animation, AnimationOutcome::Canceled);
                continue;
            }
            let progress = animation.progress(self.now);
            if progress >= 1.0 {
                let animation = self.running.remove(index);
                self.settle(doc, animation, AnimationOutcome::Completed);
                continue;
            }
            apply(doc, animation, progress);
            index += 1;
        }
        self.drain_settled()
    }

    /// Settlements not yet handed out
    pub fn drain_settled(&mut self) -> Vec<(AnimationId, AnimationOutcome)> {
        std::mem::take(&mut self.settled)
    }

    pub fn is_running(&self, id: AnimationId) -> bool {
        self.running.iter().any(|a| a.id == id)
    }

    pub fn is_running_on(&self, node: NodeId) -> bool {
        self.running.iter().any(|a| a.target == node)
    }

    pub fn running_on(&self, node: NodeId) -> Vec<AnimationId> {
        self.running.iter().filter(|a| a.target == node).map(|a| a.id).collect()
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Linear progress of a running animation
    pub fn progress(&self, id: AnimationId) -> Option<f64> {
        let animation = self.running.iter().find(|a| a.id == id)?;
        Some(animation.progress(self.now))
    }

    fn settle(&mut self, doc: &mut Document, animation: Animation, outcome: AnimationOutcome) {
        if outcome == AnimationOutcome::Completed {
            tracing::trace!("animation {:?} completed", animation.id);
        }
        for (property, value) in &animation.saved {
            restore(doc, animation.target, property, value.as_deref());
        }
        self.settled.push((animation.id, outcome));
    }
}

fn apply(doc: &mut Document, animation: &Animation, progress: f64) {
    for (property, value) in animation.sample(progress) {
        doc.set_style_property(animation.target, &property, &value.to_css());
    }
}

fn restore(doc: &mut Document, node: NodeId, property: &str, value: Option<&str>) {
    match value {
        Some(v) => {
            doc.set_style_property(node, property, v);
        }
        None => {
            doc.remove_style_property(node, property);
        }
    }
}
