//! # taxon-inference
//!
//! LLM classification for taxon.
//!
//! This crate provides:
//! - OpenAI-compatible chat completion backend
//! - Provider registry (DeepSeek, OpenAI, Qwen, Doubao) configured from env
//! - Classification prompt construction and tolerant JSON answer parsing
//! - `LlmClassifier`, the production `Classifier` implementation
//!
//! # Feature Flags
//!
//! - `mock`: Expose mock backends and classifiers for tests in dependent crates
//!
//! # Example
//!
//! ```rust,no_run
//! use taxon_inference::{LlmClassifier, ProviderRegistry};
//!
//! let registry = ProviderRegistry::from_env().unwrap();
//! let classifier = LlmClassifier::from_registry(&registry).unwrap();
//! ```

pub mod classifier;
pub mod openai;
pub mod prompt;
pub mod provider;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use taxon_core::*;

pub use classifier::LlmClassifier;
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use prompt::{
    classification_system_prompt, classification_user_prompt, parse_classification_response,
    truncate_content, ClassificationAnswer,
};
pub use provider::{ProviderConfig, ProviderRegistry};
