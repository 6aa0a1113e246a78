//! md Motion
//!
//! Animation support for overlay transitions:
//! - `DesignTokens`: named durations and easings with scoped overrides
//! - `Easing`: CSS timing functions
//! - `Keyframe` / `AnimationOptions`: what to animate and how
//! - `Animator`: the controller that starts, samples and cancels animations

mod animation;
mod controller;
mod easing;
mod tokens;

pub use animation::{AnimatedValue, AnimationId, AnimationOptions, AnimationOutcome, DurationSpec, EasingSpec, Keyframe};
pub use controller::Animator;
pub use easing::{Easing, StepPosition};
pub use tokens::{custom_property, parse_duration, DesignTokens, TokenError};
