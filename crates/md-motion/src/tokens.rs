//! Motion design tokens
//!
//! Durations and easings are looked up by name
//! (`md.sys.motion.duration.medium2`, `md.sys.motion.easing.standard`) at
//! the moment an animation starts. A name resolves, in order, from the
//! matching custom property (`--md-sys-motion-duration-medium2`) in the
//! inline style of the animated element or any of its ancestors, then from
//! the global table.

use std::collections::HashMap;

use md_dom::{Document, NodeId};
use thiserror::Error;

use crate::Easing;

pub const DURATION_PREFIX: &str = "md.sys.motion.duration.";
pub const EASING_PREFIX: &str = "md.sys.motion.easing.";

const FALLBACK_DURATION: &str = "md.sys.motion.duration.medium2";
const FALLBACK_EASING: &str = "md.sys.motion.easing.standard";

const DURATIONS: &[(&str, f64)] = &[
    ("short1", 50.0),
    ("short2", 100.0),
    ("short3", 150.0),
    ("short4", 200.0),
    ("medium1", 250.0),
    ("medium2", 300.0),
    ("medium3", 350.0),
    ("medium4", 400.0),
    ("long1", 450.0),
    ("long2", 500.0),
    ("long3", 550.0),
    ("long4", 600.0),
    ("extra-long1", 700.0),
    ("extra-long2", 800.0),
    ("extra-long3", 900.0),
    ("extra-long4", 1000.0),
];

const EASINGS: &[(&str, Easing)] = &[
    ("linear", Easing::Linear),
    ("standard", Easing::CubicBezier(0.2, 0.0, 0.0, 1.0)),
    ("standard-accelerate", Easing::CubicBezier(0.3, 0.0, 1.0, 1.0)),
    ("standard-decelerate", Easing::CubicBezier(0.0, 0.0, 0.0, 1.0)),
    ("emphasized", Easing::CubicBezier(0.2, 0.0, 0.0, 1.0)),
    ("emphasized-decelerate", Easing::CubicBezier(0.05, 0.7, 0.1, 1.0)),
    ("emphasized-accelerate", Easing::CubicBezier(0.3, 0.0, 0.8, 0.15)),
    ("legacy", Easing::CubicBezier(0.4, 0.0, 0.2, 1.0)),
    ("legacy-decelerate", Easing::CubicBezier(0.0, 0.0, 0.2, 1.0)),
    ("legacy-accelerate", Easing::CubicBezier(0.4, 0.0, 1.0, 1.0)),
];

/// Why a token override was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("'{0}' is not a motion token name")]
    UnknownToken(String),

    #[error("invalid value '{value}' for token '{name}'")]
    InvalidValue { name: String, value: String },
}

/// Custom property name for a token (`md.sys.x` → `--md-sys-x`)
pub fn custom_property(token: &str) -> String {
    format!("--{}", token.replace('.', "-"))
}

/// Parse a CSS time (`120ms`, `0.2s`, or a bare millisecond count)
pub fn parse_duration(css: &str) -> Option<f64> {
    let css = css.trim();
    let ms = if let Some(v) = css.strip_suffix("ms") {
        v.trim().parse::<f64>().ok()?
    } else if let Some(v) = css.strip_suffix('s') {
        v.trim().parse::<f64>().ok()? * 1000.0
    } else {
        css.parse::<f64>().ok()?
    };
    (ms.is_finite() && ms >= 0.0).then_some(ms)
}

/// Global token table
#[derive(Debug, Clone)]
pub struct DesignTokens {
    durations: HashMap<String, f64>,
    easings: HashMap<String, Easing>,
}

impl Default for DesignTokens {
    fn default() -> Self {
        Self {
            durations: DURATIONS
                .iter()
                .map(|(name, ms)| (format!("{DURATION_PREFIX}{name}"), *ms))
                .collect(),
            easings: EASINGS
                .iter()
                .map(|(name, easing)| (format!("{EASING_PREFIX}{name}"), *easing))
                .collect(),
        }
    }
}

impl DesignTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override or add a duration token (milliseconds)
    pub fn set_duration(&mut self, name: &str, ms: f64) {
        self.durations.insert(name.to_string(), ms.max(0.0));
    }

    /// Override or add an easing token
    pub fn set_easing(&mut self, name: &str, easing: Easing) {
        self.easings.insert(name.to_string(), easing);
    }

    /// Set a token from its CSS value; the prefix decides the kind
    pub fn set_from_css(&mut self, name: &str, value: &str) -> Result<(), TokenError> {
        let invalid = || TokenError::InvalidValue { name: name.to_string(), value: value.to_string() };
        if name.starts_with(DURATION_PREFIX) {
            let ms = parse_duration(value).ok_or_else(invalid)?;
            self.set_duration(name, ms);
        } else if name.starts_with(EASING_PREFIX) {
            let easing = Easing::parse(value).ok_or_else(invalid)?;
            self.set_easing(name, easing);
        } else {
            return Err(TokenError::UnknownToken(name.to_string()));
        }
        Ok(())
    }

    /// Global duration for a token, if defined
    pub fn global_duration(&self, name: &str) -> Option<f64> {
        self.durations.get(name).copied()
    }

    pub fn global_easing(&self, name: &str) -> Option<Easing> {
        self.easings.get(name).copied()
    }

    /// Duration for `name` as seen from `node`
    pub fn duration(&self, doc: &Document, node: NodeId, name: &str) -> f64 {
        if let Some(ms) = scoped(doc, node, name, parse_duration) {
            return ms;
        }
        if let Some(ms) = self.global_duration(name) {
            return ms;
        }
        tracing::warn!("unknown duration token '{}', using {}", name, FALLBACK_DURATION);
        self.global_duration(FALLBACK_DURATION).unwrap_or(300.0)
    }

    /// Easing for `name` as seen from `node`
    pub fn easing(&self, doc: &Document, node: NodeId, name: &str) -> Easing {
        if let Some(easing) = scoped(doc, node, name, Easing::parse) {
            return easing;
        }
        if let Some(easing) = self.global_easing(name) {
            return easing;
        }
        tracing::warn!("unknown easing token '{}', using {}", name, FALLBACK_EASING);
        self.global_easing(FALLBACK_EASING).unwrap_or_default()
    }
}

/// Closest inclusive-ancestor override of a token
fn scoped<T>(doc: &Document, node: NodeId, name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let property = custom_property(name);
    let tree = doc.tree();
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .filter(|n| doc.is_element(*n))
        .find_map(|n| {
            let raw = doc.style_property(n, &property)?;
            let parsed = parse(&raw);
            if parsed.is_none() {
                tracing::debug!("ignoring unparseable {} = '{}' on {}", property, raw, n);
            }
            parsed
        })
}
