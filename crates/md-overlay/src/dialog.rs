//! Dialog controller state
//!
//! Per-dialog bookkeeping kept in the data store under `DIALOG_KEY`. The
//! transitions themselves are driven by `Runtime`, which owns the document,
//! the animator and the overlay service.

use std::fmt;

use md_core::{NodeId, Properties, PropertySchema, PropertySpec};
use md_motion::{AnimationId, AnimationOptions, Keyframe};

use crate::RuntimeConfig;

/// Data store key of the controller
pub const DIALOG_KEY: &str = "md.dialog";

/// Element holding the dialog surface
pub const CONTAINER_SELECTOR: &str = ".md-dialog__container";

/// Elements that count as the dialog scrim
pub const SCRIM_SELECTOR: &str = ".md-dialog__scrim, [data-md-dialog-scrim]";

/// Attribute closing the enclosing dialog with its value
pub const ACTION_ATTRIBUTE: &str = "data-md-dialog-action";

/// Class toggled by the `stacked` property
pub const STACKED_CLASS: &str = "md-dialog--stacked";

/// Lifecycle of one dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Inactive,
    Opening,
    Active,
    Closing,
}

impl DialogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogState::Inactive => "inactive",
            DialogState::Opening => "opening",
            DialogState::Active => "active",
            DialogState::Closing => "closing",
        }
    }
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the current transition is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Phase {
    #[default]
    Idle,
    Animating(AnimationId),
    /// Open animation done; focus moves on the next frame
    AwaitingFrame,
}

/// Transition requested while another was in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Intent {
    Open,
    Close(Option<String>),
}

#[derive(Debug, Clone)]
pub(crate) struct DialogController {
    pub(crate) state: DialogState,
    pub(crate) phase: Phase,
    pub(crate) pending: Option<Intent>,
    pub(crate) props: Properties,
    /// Focus target and animated surface; the root when there is no container
    pub(crate) container: NodeId,
    pub(crate) return_value: Option<String>,
}

impl DialogController {
    pub(crate) fn new(props: Properties, container: NodeId) -> Self {
        Self {
            state: DialogState::Inactive,
            phase: Phase::Idle,
            pending: None,
            props,
            container,
            return_value: None,
        }
    }

    pub(crate) fn animation(&self) -> Option<AnimationId> {
        match self.phase {
            Phase::Animating(id) => Some(id),
            _ => None,
        }
    }
}

/// Dialog properties with defaults taken from the runtime configuration
pub fn dialog_schema(config: &RuntimeConfig) -> PropertySchema {
    PropertySchema::new(vec![
        PropertySpec::boolean("open", "open", false).reflected(),
        PropertySpec::boolean("closeOnEscape", "close-on-escape", config.close_on_escape),
        PropertySpec::boolean("closeOnOverlayClick", "close-on-overlay-click", config.close_on_overlay_click),
        PropertySpec::boolean("stacked", "stacked", false).reflected(),
        PropertySpec::boolean("lockScroll", "lock-scroll", config.lock_scroll),
    ])
}

pub(crate) fn open_keyframes() -> Vec<Keyframe> {
    vec![
        Keyframe::new().with("opacity", "0").with("scale", "0.8"),
        Keyframe::new().with("opacity", "1").with("scale", "1"),
    ]
}

pub(crate) fn close_keyframes() -> Vec<Keyframe> {
    vec![
        Keyframe::new().with("opacity", "1").with("scale", "1"),
        Keyframe::new().with("opacity", "0").with("scale", "0.8"),
    ]
}

pub(crate) fn open_timing() -> AnimationOptions {
    AnimationOptions::tokens("md.sys.motion.duration.medium4", "md.sys.motion.easing.emphasized-decelerate")
}

pub(crate) fn close_timing() -> AnimationOptions {
    AnimationOptions::tokens("md.sys.motion.duration.short4", "md.sys.motion.easing.emphasized-accelerate")
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_core::Document;

    #[test]
    fn test_schema_defaults_follow_config() {
        let config = RuntimeConfig { close_on_escape: false, ..RuntimeConfig::default() };
        let props = dialog_schema(&config).defaults();
        assert!(!props.get_bool("open"));
        assert!(!props.get_bool("closeOnEscape"));
        assert!(props.get_bool("closeOnOverlayClick"));
        assert!(props.get_bool("lockScroll"));
    }

    #[test]
    fn test_schema_reads_attributes() {
        let mut doc = Document::new();
        let dialog = doc.create_element("div");
        let _ = doc.set_attr(dialog, "close-on-escape", "false");
        let _ = doc.set_attr(dialog, "stacked", "");
        let props = dialog_schema(&RuntimeConfig::default()).from_attributes(&doc, dialog);
        assert!(!props.get_bool("closeOnEscape"));
        assert!(props.get_bool("stacked"));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(DialogState::default(), DialogState::Inactive);
        assert_eq!(DialogState::Closing.to_string(), "closing");
    }

    #[test]
    fn test_keyframes_mirror() {
        let open = open_keyframes();
        let close = close_keyframes();
        assert_eq!(open[0].properties, close[1].properties);
        assert_eq!(open[1].properties, close[0].properties);
    }
}
