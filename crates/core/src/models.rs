//! # Compass Models
//!
//! Centralized configuration for the text-generation provider behind the
//! Learn stage. Read once at startup; the generator never touches the
//! environment itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model used when `OPENAI_MODEL` is unset
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// OpenAI-compatible API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the provider credential
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable overriding the model name
pub const MODEL_VAR: &str = "OPENAI_MODEL";
/// Environment variable overriding the API root
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

/// Configuration for the plan provider
///
/// ## Example
/// ```rust,ignore
/// use compass_core::models::PlanConfig;
///
/// // Whatever the process environment says
/// let config = PlanConfig::from_env();
///
/// // Explicit, e.g. for a local OpenAI-compatible server
/// let config = PlanConfig::default()
///     .with_api_key("sk-test")
///     .with_base_url("http://localhost:4000/v1");
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanConfig {
    /// Provider credential. `None` selects the static plan.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name (e.g., "gpt-4o-mini")
    pub model: String,
    /// Base URL of an OpenAI-compatible chat completions API
    pub base_url: String,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl fmt::Debug for PlanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl PlanConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_key: read(API_KEY_VAR),
            model: read(MODEL_VAR).unwrap_or(defaults.model),
            base_url: read(BASE_URL_VAR).unwrap_or(defaults.base_url),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Whether a live provider call is configured
    pub fn is_live(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full chat completions URL
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PlanConfig::from_lookup(lookup(&[]));
        assert!(!config.is_live());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(
            config.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = PlanConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-live"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_BASE_URL", "http://localhost:4000/v1/"),
        ]));
        assert!(config.is_live());
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(
            config.completions_url(),
            "http://localhost:4000/v1/chat/completions"
        );
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = PlanConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")]));
        assert!(!config.is_live());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = PlanConfig::default().with_api_key("sk-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(!serde_json::to_string(&config).unwrap().contains("sk-secret"));
    }
}
