//! OpenAI-compatible generation backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use taxon_core::{defaults, Error, GenerationBackend, Result};

use super::error::{to_taxon_error, OpenAIErrorCode};
use super::types::*;

/// Default OpenAI API endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the answer.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: defaults::LLM_TEMPERATURE,
            max_tokens: defaults::LLM_MAX_TOKENS,
            timeout_seconds: defaults::LLM_HTTP_TIMEOUT_SECS,
        }
    }
}

/// OpenAI-compatible generation backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            model = %config.model,
            "Initializing OpenAI-compatible backend"
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let start = Instant::now();
        debug!(
            subsystem = "inference",
            component = "openai",
            op = "generate",
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending chat completion"
        );

        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: OpenAIErrorResponse = response
                .json()
                .await
                .unwrap_or_else(|_| OpenAIErrorResponse::unknown());
            let code = OpenAIErrorCode::from_response(status.as_u16(), &body.error.error_type);
            return Err(to_taxon_error(
                code,
                &format!("{} returned {}: {}", self.config.model, status, body.error.message),
            ));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Classifier(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Classifier("Response contained no choices".to_string()))?;

        debug!(
            subsystem = "inference",
            component = "openai",
            op = "generate",
            model = %self.config.model,
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion finished"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
