//! Runtime configuration

use std::collections::BTreeMap;

use md_motion::{DesignTokens, TokenError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid runtime configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("trigger attribute must not be empty")]
    EmptyTriggerAttribute,
}

/// Runtime settings; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// Attribute marking declarative dialog triggers
    pub trigger_attribute: String,
    pub close_on_escape: bool,
    pub close_on_overlay_click: bool,
    pub lock_scroll: bool,
    /// Design token overrides (token name → CSS value)
    pub tokens: BTreeMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            trigger_attribute: "data-md-dialog".to_string(),
            close_on_escape: true,
            close_on_overlay_click: true,
            lock_scroll: true,
            tokens: BTreeMap::new(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a JSON configuration document
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_json::from_str(text)?;
        if config.trigger_attribute.trim().is_empty() {
            return Err(ConfigError::EmptyTriggerAttribute);
        }
        Ok(config)
    }

    /// Selector matching trigger elements
    pub fn trigger_selector(&self) -> String {
        format!("[{}]", self.trigger_attribute.trim())
    }

    /// Apply the token overrides; invalid entries are skipped and returned
    pub fn apply_tokens(&self, tokens: &mut DesignTokens) -> Vec<TokenError> {
        let mut errors = Vec::new();
        for (name, value) in &self.tokens {
            if let Err(err) = tokens.set_from_css(name, value) {
                tracing::warn!("token override skipped: {}", err);
                errors.push(err);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.trigger_attribute, "data-md-dialog");
        assert!(config.close_on_escape && config.close_on_overlay_click && config.lock_scroll);
        assert_eq!(config.trigger_selector(), "[data-md-dialog]");
    }

    #[test]
    fn test_partial_json() {
        let config = RuntimeConfig::from_json(r#"{"closeOnEscape": false, "tokens": {"md.sys.motion.duration.medium4": "120ms"}}"#).unwrap();
        assert!(!config.close_on_escape);
        assert!(config.lock_scroll);
        assert_eq!(config.tokens.len(), 1);
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(RuntimeConfig::from_json("{"), Err(ConfigError::Json(_))));
        assert!(matches!(
            RuntimeConfig::from_json(r#"{"triggerAttribute": " "}"#),
            Err(ConfigError::EmptyTriggerAttribute)
        ));
    }

    #[test]
    fn test_apply_tokens_skips_invalid() {
        let mut config = RuntimeConfig::default();
        config.tokens.insert("md.sys.motion.duration.short4".into(), "0.05s".into());
        config.tokens.insert("md.sys.motion.easing.standard".into(), "wobbly".into());
        config.tokens.insert("brand.color".into(), "red".into());

        let mut tokens = DesignTokens::new();
        let errors = config.apply_tokens(&mut tokens);
        assert_eq!(errors.len(), 2);
        assert_eq!(tokens.global_duration("md.sys.motion.duration.short4"), Some(50.0));
    }
}
