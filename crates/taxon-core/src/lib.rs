//! # taxon-core
//!
//! Core types, traits, and abstractions for the taxon classification service.
//!
//! This crate provides the domain model (category groups, content items,
//! classification results), the shared error type, the repository and
//! collaborator traits that the storage, inference, and HTTP crates
//! implement, and the pure presentation helpers used to paginate history.

pub mod defaults;
pub mod error;
pub mod hashing;
pub mod models;
pub mod presentation;
pub mod traits;
pub mod uuid_utils;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use hashing::{content_hash, token_fingerprint};
pub use models::*;
pub use presentation::{page, total_pages, DisplayItem, DisplayResult, Page};
pub use traits::*;
pub use uuid_utils::new_v7;
pub use validation::{
    category_key, normalize_label, normalize_rule_conditions, validate_category_name,
    validate_email_rule_input, validate_group_input,
};
