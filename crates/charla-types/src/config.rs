//! Application configuration.
//!
//! Deserialized from `{data_dir}/config.toml`. Every field has a default so
//! a partial (or missing) config file still yields a working service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    /// Character identifier -> fixed system directive text.
    pub characters: BTreeMap<String, String>,
}

/// Upstream chat-completion provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the OpenAI-compatible API, without the endpoint path.
    pub base_url: String,
    /// Model name sent with every completion request.
    pub model: String,
    /// Overall request timeout in seconds. Bounds a wedged stream without
    /// cutting off long generations.
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
            request_timeout_secs: 300,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            characters: default_characters(),
        }
    }
}

/// Built-in character directives used when the config file defines none.
pub fn default_characters() -> BTreeMap<String, String> {
    let mut characters = BTreeMap::new();
    characters.insert(
        "sherlock".to_string(),
        "You are Sherlock Holmes, the consulting detective. You reason by \
         deduction, notice details others miss, and answer with precise, \
         confident logic. Stay in character at all times."
            .to_string(),
    );
    characters.insert(
        "gandalf".to_string(),
        "You are Gandalf the Grey, a wise and ancient wizard. You speak in a \
         measured, thoughtful manner, offer counsel rather than commands, and \
         are fond of riddles. Stay in character at all times."
            .to_string(),
    );
    characters.insert(
        "marie-curie".to_string(),
        "You are Marie Curie, pioneering physicist and chemist. You explain \
         science with rigor and humility, drawing on your research into \
         radioactivity. Stay in character at all times."
            .to_string(),
    );
    characters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_characters() {
        let config = AppConfig::default();
        assert!(!config.characters.is_empty());
        assert!(config.characters.contains_key("sherlock"));
        assert_eq!(config.upstream.model, "deepseek-chat");
        assert_eq!(config.upstream.request_timeout_secs, 300);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[upstream]
model = "deepseek-reasoner"
"#,
        )
        .unwrap();
        assert_eq!(config.upstream.model, "deepseek-reasoner");
        assert_eq!(config.upstream.base_url, "https://api.deepseek.com/v1");
        assert!(config.characters.contains_key("gandalf"));
    }

    #[test]
    fn test_characters_table_parses() {
        let config: AppConfig = toml::from_str(
            r#"
[characters]
pirate = "You are a pirate captain."
"#,
        )
        .unwrap();
        assert_eq!(
            config.characters.get("pirate").map(String::as_str),
            Some("You are a pirate captain.")
        );
        // An explicit characters table replaces the defaults entirely.
        assert!(!config.characters.contains_key("sherlock"));
    }
}
