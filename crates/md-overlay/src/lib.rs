//! md Overlay
//!
//! Modal stack management on top of `md-core` and `md-motion`:
//! - `OverlayService`: overlay stack, scroll lock counter, inert background
//! - dialog controllers and their `inactive → opening → active → closing`
//!   transitions
//! - Escape handling, focus trapping, declarative triggers
//! - `Runtime`, the host object tying it all together

mod config;
mod dialog;
mod keyboard;
mod runtime;
mod service;
mod transition;
mod triggers;

pub use config::{ConfigError, RuntimeConfig};
pub use dialog::{
    dialog_schema, DialogState, ACTION_ATTRIBUTE, CONTAINER_SELECTOR, DIALOG_KEY, SCRIM_SELECTOR, STACKED_CLASS,
};
pub use runtime::{Runtime, FRAME_MS};
pub use service::{OverlayContext, OverlayService};
