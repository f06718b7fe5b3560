//! OpenAI-compatible chat completion backend.
//!
//! Works with any endpoint speaking the OpenAI chat completions protocol,
//! including:
//!
//! - DeepSeek
//! - OpenAI cloud API and Azure OpenAI
//! - Qwen (DashScope compatible mode)
//! - Doubao (Volcengine Ark)
//!
//! # Example
//!
//! ```rust,no_run
//! use taxon_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use taxon_core::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         base_url: "https://api.deepseek.com/v1".to_string(),
//!         api_key: Some("sk-...".to_string()),
//!         model: "deepseek-chat".to_string(),
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!     let answer = backend.generate("Hello").await.unwrap();
//!     println!("{}", answer);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, DEFAULT_MODEL, DEFAULT_OPENAI_URL};
pub use error::{to_taxon_error, OpenAIErrorCode};
pub use types::*;
