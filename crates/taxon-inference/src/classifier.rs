//! LLM-backed classifier.
//!
//! Holds one generation backend per registered provider and turns a
//! `ClassificationRequest` into a chat completion, then parses the answer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use taxon_core::{
    ClassificationRequest, Classifier, ClassifierVerdict, Error, GenerationBackend, Result,
};

use crate::openai::OpenAIBackend;
use crate::prompt::{
    classification_system_prompt, classification_user_prompt, parse_classification_response,
};
use crate::provider::ProviderRegistry;

/// Classifier routing each request to the backend of its provider.
#[derive(Clone, Default)]
pub struct LlmClassifier {
    backends: HashMap<String, Arc<dyn GenerationBackend>>,
}

impl LlmClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// One OpenAI-compatible backend per registered provider.
    pub fn from_registry(registry: &ProviderRegistry) -> Result<Self> {
        let mut classifier = Self::new();
        for provider in registry.providers() {
            let backend = OpenAIBackend::new(provider.openai_config())?;
            classifier = classifier.with_backend(provider.id.clone(), Arc::new(backend));
        }
        Ok(classifier)
    }

    /// Route `provider` to `backend`.
    pub fn with_backend(
        mut self,
        provider: impl Into<String>,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        self.backends.insert(provider.into(), backend);
        self
    }

    pub fn has_backend(&self, provider: &str) -> bool {
        self.backends.contains_key(provider)
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, req: &ClassificationRequest) -> Result<ClassifierVerdict> {
        let backend = self
            .backends
            .get(&req.provider)
            .ok_or_else(|| Error::InvalidProvider(req.provider.clone()))?;

        let start = Instant::now();
        let system = classification_system_prompt(&req.group_name, &req.categories);
        let prompt = classification_user_prompt(&req.content, req.content_kind);
        let response = backend.generate_with_system(&system, &prompt).await?;
        let answer = parse_classification_response(&response)?;

        debug!(
            subsystem = "inference",
            component = "classifier",
            op = "classify",
            provider = %req.provider,
            model = backend.model_name(),
            group_name = %req.group_name,
            label = %answer.classification,
            confidence = answer.confidence,
            duration_ms = start.elapsed().as_millis() as u64,
            "Classifier answered"
        );

        Ok(ClassifierVerdict {
            classification: answer.classification,
            confidence: answer.confidence,
            explanation: answer.explanation,
            llm_provider: req.provider.clone(),
            llm_model: backend.model_name().to_string(),
        })
    }
}
