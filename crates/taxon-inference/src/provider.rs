//! LLM provider registry.
//!
//! Each provider is an OpenAI-compatible chat endpoint identified by a short
//! id (`deepseek`, `openai`, `qwen`, `doubao`, ...). The registry is the
//! server-side provider-listing collaborator: a submission may only name a
//! registered provider.
//!
//! Providers are configured from the environment:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `LLM_PROVIDERS` | comma-separated provider ids |
//! | `DEFAULT_LLM_PROVIDER` | provider used when a submission names none |
//! | `<PREFIX>_API_KEY` | API key |
//! | `<PREFIX>_API_URL` | base URL |
//! | `<PREFIX>_MODEL_NAME` | model |
//! | `LLM_TEMPERATURE`, `LLM_MAX_TOKENS` | sampling options shared by all providers |
//!
//! `<PREFIX>` is the upper-cased id, except `doubao` which reads `ARK_*`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use taxon_core::{defaults, Error, ProviderCatalog, Result};

use crate::openai::{OpenAIConfig, DEFAULT_MODEL, DEFAULT_OPENAI_URL};

/// Built-in endpoint and model for well-known providers.
fn known_defaults(id: &str) -> Option<(&'static str, &'static str)> {
    match id {
        "deepseek" => Some(("https://api.deepseek.com/v1", "deepseek-chat")),
        "openai" => Some((DEFAULT_OPENAI_URL, DEFAULT_MODEL)),
        "qwen" => Some((
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            "qwen-max",
        )),
        "doubao" => Some(("https://ark.cn-beijing.volces.com/api/v3", "doubao-pro-32k")),
        _ => None,
    }
}

/// Environment variable prefix for a provider id.
pub fn env_prefix(id: &str) -> String {
    match id {
        "doubao" => "ARK".to_string(),
        other => other.to_uppercase().replace('-', "_"),
    }
}

/// Configuration for a registered provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier (e.g., "deepseek", "openai").
    pub id: String,
    /// Base URL for the provider's API.
    pub base_url: String,
    /// API key.
    pub api_key: Option<String>,
    /// Model name sent with every request.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Default timeout for requests.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Configuration with built-in defaults for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let (base_url, model) = known_defaults(&id).unwrap_or((DEFAULT_OPENAI_URL, DEFAULT_MODEL));
        Self {
            id,
            base_url: base_url.to_string(),
            api_key: None,
            model: model.to_string(),
            temperature: defaults::LLM_TEMPERATURE,
            max_tokens: defaults::LLM_MAX_TOKENS,
            timeout: Duration::from_secs(defaults::LLM_HTTP_TIMEOUT_SECS),
        }
    }

    /// Configuration for `id` with overrides read through `lookup`.
    pub fn from_lookup<F>(id: &str, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = env_prefix(id);
        let mut config = Self::new(id);
        if let Some(url) = lookup(&format!("{}_API_URL", prefix)) {
            config.base_url = url;
        }
        config.api_key = lookup(&format!("{}_API_KEY", prefix)).filter(|k| !k.is_empty());
        if let Some(model) = lookup(&format!("{}_MODEL_NAME", prefix)) {
            config.model = model;
        }
        if let Some(t) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            config.temperature = t;
        }
        if let Some(n) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            config.max_tokens = n;
        }
        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Backend configuration for this provider.
    pub fn openai_config(&self) -> OpenAIConfig {
        OpenAIConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_seconds: self.timeout.as_secs(),
        }
    }
}

/// Registry of configured LLM providers, in registration order.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConfig>,
    order: Vec<String>,
    default_provider: String,
}

impl ProviderRegistry {
    /// Create a new empty provider registry.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            order: Vec::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Build the registry from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the registry from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ids: Vec<String> = match lookup("LLM_PROVIDERS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults::LLM_PROVIDERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        if ids.is_empty() {
            return Err(Error::Config("LLM_PROVIDERS is empty".to_string()));
        }

        let default_provider = lookup("DEFAULT_LLM_PROVIDER")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| defaults::DEFAULT_LLM_PROVIDER.to_string());
        if !ids.contains(&default_provider) {
            return Err(Error::Config(format!(
                "DEFAULT_LLM_PROVIDER '{}' is not listed in LLM_PROVIDERS",
                default_provider
            )));
        }

        let mut registry = Self::new(default_provider);
        for id in &ids {
            let config = ProviderConfig::from_lookup(id, &lookup);
            if config.api_key.is_none() {
                warn!(
                    subsystem = "inference",
                    component = "registry",
                    provider = %id,
                    "No API key configured for provider"
                );
            }
            registry.register(config);
        }
        Ok(registry)
    }

    /// Register a provider. Re-registering an id replaces its config.
    pub fn register(&mut self, config: ProviderConfig) {
        info!(
            subsystem = "inference",
            component = "registry",
            provider = %config.id,
            base_url = %config.base_url,
            model = %config.model,
            "Registering LLM provider"
        );
        if !self.providers.contains_key(&config.id) {
            self.order.push(config.id.clone());
        }
        self.providers.insert(config.id.clone(), config);
    }

    /// Get the default provider ID.
    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// Get all registered provider IDs in registration order.
    pub fn provider_ids(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// Get a provider config by ID.
    pub fn get_provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.get(id)
    }

    /// Check if a provider is registered.
    pub fn has_provider(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Iterate providers in registration order.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.order.iter().filter_map(|id| self.providers.get(id))
    }
}

#[async_trait]
impl ProviderCatalog for ProviderRegistry {
    async fn list_providers(&self) -> Result<Vec<String>> {
        Ok(self.order.clone())
    }

    async fn has_provider(&self, provider: &str) -> Result<bool> {
        Ok(self.providers.contains_key(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let registry = ProviderRegistry::from_lookup(|_| None).unwrap();
        assert_eq!(registry.default_provider(), "deepseek");
        assert_eq!(
            registry.provider_ids(),
            vec!["deepseek", "openai", "qwen", "doubao"]
        );
        let deepseek = registry.get_provider("deepseek").unwrap();
        assert_eq!(deepseek.model, "deepseek-chat");
        assert!(deepseek.api_key.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let registry = ProviderRegistry::from_lookup(lookup_from(&[
            ("LLM_PROVIDERS", "deepseek, doubao"),
            ("DEEPSEEK_API_KEY", "sk-test"),
            ("DEEPSEEK_API_URL", "http://localhost:9000/v1"),
            ("ARK_MODEL_NAME", "ep-2024"),
            ("LLM_TEMPERATURE", "0.2"),
            ("LLM_MAX_TOKENS", "256"),
        ]))
        .unwrap();

        assert_eq!(registry.provider_ids(), vec!["deepseek", "doubao"]);
        let deepseek = registry.get_provider("deepseek").unwrap();
        assert_eq!(deepseek.api_key.as_deref(), Some("sk-test"));
        assert_eq!(deepseek.base_url, "http://localhost:9000/v1");
        assert_eq!(deepseek.max_tokens, 256);
        assert!((deepseek.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(registry.get_provider("doubao").unwrap().model, "ep-2024");
    }

    #[test]
    fn test_default_provider_must_be_registered() {
        let err = ProviderRegistry::from_lookup(lookup_from(&[
            ("LLM_PROVIDERS", "openai"),
            ("DEFAULT_LLM_PROVIDER", "deepseek"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_provider_list_rejected() {
        let err = ProviderRegistry::from_lookup(lookup_from(&[("LLM_PROVIDERS", " , ")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(env_prefix("deepseek"), "DEEPSEEK");
        assert_eq!(env_prefix("doubao"), "ARK");
        assert_eq!(env_prefix("my-llm"), "MY_LLM");
    }

    #[test]
    fn test_unknown_provider_uses_openai_defaults() {
        let config = ProviderConfig::new("custom");
        assert_eq!(config.base_url, DEFAULT_OPENAI_URL);
        assert_eq!(config.openai_config().model, DEFAULT_MODEL);
    }

    #[test]
    fn test_register_replaces_without_duplicating_order() {
        let mut registry = ProviderRegistry::new("a");
        registry.register(ProviderConfig::new("a"));
        registry.register(ProviderConfig::new("a").with_model("m2"));
        assert_eq!(registry.provider_ids(), vec!["a"]);
        assert_eq!(registry.get_provider("a").unwrap().model, "m2");
    }

    #[tokio::test]
    async fn test_catalog_lists_registered_providers() {
        let mut registry = ProviderRegistry::new("deepseek");
        registry.register(ProviderConfig::new("deepseek"));
        registry.register(ProviderConfig::new("qwen"));

        let listed = registry.list_providers().await.unwrap();
        assert_eq!(listed, vec!["deepseek", "qwen"]);
        assert!(ProviderCatalog::has_provider(&registry, "qwen").await.unwrap());
        assert!(!ProviderCatalog::has_provider(&registry, "bogus").await.unwrap());
    }
}
