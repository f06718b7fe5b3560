//! Mock generation backend and classifier for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taxon_inference::mock::MockClassifier;
//!
//! let classifier = MockClassifier::new()
//!     .with_answer("Urgency", "High", 0.9)
//!     .failing_group("Topic", "rate limited")
//!     .with_group_delay_ms("Sentiment", 50);
//! assert_eq!(classifier.call_count(), 0);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;

use taxon_core::{
    ClassificationRequest, Classifier, ClassifierVerdict, Error, GenerationBackend, Result,
};

/// Mock chat backend returning canned answers.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockBackendConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockBackendConfig {
    model: String,
    fixed_responses: HashMap<String, String>,
    default_response: String,
    latency_ms: u64,
    fail_with: Option<String>,
}

/// One recorded generation call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub system: String,
    pub prompt: String,
    pub timestamp: Instant,
}

impl Default for MockBackendConfig {
    fn default() -> Self {
        Self {
            model: "mock-model".to_string(),
            fixed_responses: HashMap::new(),
            default_response: "Mock response".to_string(),
            latency_ms: 0,
            fail_with: None,
        }
    }
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockBackendConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Model name reported by `model_name()`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    /// Answer every prompt with `response`.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Answer prompts containing `needle` with `output`.
    pub fn with_response_mapping(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_responses
            .insert(needle.into(), output.into());
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Fail every call with `Error::Classifier(message)`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).fail_with = Some(message.into());
        self
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    pub fn generate_call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    fn log_call(&self, operation: &str, system: &str, prompt: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            system: system.to_string(),
            prompt: prompt.to_string(),
            timestamp: Instant::now(),
        });
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.log_call("generate", system, prompt);
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(ref message) = self.config.fail_with {
            return Err(Error::Classifier(message.clone()));
        }

        let mapped = self
            .config
            .fixed_responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()) || system.contains(needle.as_str()))
            .map(|(_, output)| output.clone());

        Ok(mapped.unwrap_or_else(|| self.config.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Clone)]
enum GroupBehavior {
    Answer { label: String, confidence: f64 },
    Fail(String),
}

#[derive(Debug, Clone, Default)]
struct MockClassifierConfig {
    model: Option<String>,
    default_answer: Option<(String, f64)>,
    groups: HashMap<String, GroupBehavior>,
    delays_ms: HashMap<String, u64>,
}

/// Mock classifier keyed by category group name.
///
/// Groups without a configured behavior get the default answer, or the
/// group's first category with confidence 0.8 when no default is set.
#[derive(Clone, Default)]
pub struct MockClassifier {
    config: Arc<MockClassifierConfig>,
    requests: Arc<Mutex<Vec<ClassificationRequest>>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = Some(model.into());
        self
    }

    pub fn with_default_answer(mut self, label: impl Into<String>, confidence: f64) -> Self {
        Arc::make_mut(&mut self.config).default_answer = Some((label.into(), confidence));
        self
    }

    pub fn with_answer(
        mut self,
        group: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Arc::make_mut(&mut self.config).groups.insert(
            group.into(),
            GroupBehavior::Answer {
                label: label.into(),
                confidence,
            },
        );
        self
    }

    pub fn failing_group(mut self, group: impl Into<String>, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .groups
            .insert(group.into(), GroupBehavior::Fail(message.into()));
        self
    }

    pub fn with_group_delay_ms(mut self, group: impl Into<String>, delay_ms: u64) -> Self {
        Arc::make_mut(&mut self.config)
            .delays_ms
            .insert(group.into(), delay_ms);
        self
    }

    /// Requests received so far, in arrival order.
    pub fn get_requests(&self) -> Vec<ClassificationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, req: &ClassificationRequest) -> Result<ClassifierVerdict> {
        self.requests.lock().unwrap().push(req.clone());

        if let Some(delay) = self.config.delays_ms.get(&req.group_name) {
            tokio::time::sleep(tokio::time::Duration::from_millis(*delay)).await;
        }

        let (label, confidence) = match self.config.groups.get(&req.group_name) {
            Some(GroupBehavior::Fail(message)) => {
                return Err(Error::Classifier(message.clone()));
            }
            Some(GroupBehavior::Answer { label, confidence }) => (label.clone(), *confidence),
            None => match self.config.default_answer {
                Some((ref label, confidence)) => (label.clone(), confidence),
                None => (
                    req.categories.first().cloned().unwrap_or_default(),
                    0.8,
                ),
            },
        };

        Ok(ClassifierVerdict {
            classification: label,
            confidence,
            explanation: format!("mock answer for {}", req.group_name),
            llm_provider: req.provider.clone(),
            llm_model: self
                .config
                .model
                .clone()
                .unwrap_or_else(|| format!("{}-mock", req.provider)),
        })
    }
}
