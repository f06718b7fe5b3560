//! # taxon-classify
//!
//! Classification submission for taxon.
//!
//! This crate provides:
//! - The submission coordinator, which fans content out to every active
//!   category group concurrently and collects one result per group
//! - Text extraction for uploaded files and email files
//! - Priority-ordered matching of email classification rules
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use taxon_classify::{NewContentItem, SubmissionCoordinator};
//! use taxon_db::MemoryStore;
//! use taxon_inference::{LlmClassifier, ProviderRegistry};
//!
//! let store = MemoryStore::new();
//! let registry = ProviderRegistry::from_env()?;
//! let classifier = LlmClassifier::from_registry(&registry)?;
//!
//! let coordinator = SubmissionCoordinator::new(
//!     Arc::new(store.clone()),
//!     Arc::new(store.clone()),
//!     Arc::new(store),
//!     Arc::new(classifier),
//!     Arc::new(registry),
//! );
//!
//! let submitted = coordinator
//!     .submit(NewContentItem::text("Outage", "Login is broken", "user"), "deepseek")
//!     .await?;
//! for result in &submitted.classification_results {
//!     println!("{}: {}", result.metadata.category_group_name, result.classification);
//! }
//! ```

pub mod coordinator;
pub mod extraction;
pub mod rules;

// Re-export core types
pub use taxon_core::*;

pub use coordinator::{CoordinatorConfig, SubmissionCoordinator};
pub use extraction::{
    detect_file_type, extract_email, extract_file, EmailFileType, ExtractedContent, FileType,
};
pub use rules::{evaluate_rule, first_match, ALL_CONDITIONS_MET};
