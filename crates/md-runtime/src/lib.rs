//! md Runtime
//!
//! The DOM runtime underneath the md component set, as one crate:
//!
//! ```text
//! md-dom      document tree, selectors, focus, native listeners
//! md-html     HTML parsing
//! md-core     collections, capabilities, data store, delegation
//! md-motion   design tokens and the animator
//! md-overlay  overlay stack, dialogs, the Runtime host
//! ```

pub use md_core;
pub use md_dom;
pub use md_html;
pub use md_motion;
pub use md_overlay;

pub use md_core::{
    dispatch, parse_options, Collection, DataStore, Delegator, Event, EventHost, HandlerId, Options, Target, Value,
};
pub use md_dom::{Document, NodeId};
pub use md_html::{HtmlError, HtmlResult};
pub use md_motion::{AnimationOptions, AnimationOutcome, Animator, DesignTokens, Easing, Keyframe};
pub use md_overlay::{ConfigError, DialogState, OverlayService, Runtime, RuntimeConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a page and start a runtime on it
pub fn start(html: &str, config: RuntimeConfig) -> HtmlResult<Runtime> {
    let document = md_html::parse_document(html)?;
    tracing::debug!("starting runtime on {} nodes", document.tree().len());
    Ok(Runtime::with_config(document, config))
}
