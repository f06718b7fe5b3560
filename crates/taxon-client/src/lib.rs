//! # taxon-client
//!
//! Typed REST client for the taxon HTTP API.
//!
//! Every call goes through an explicit [`ClientContext`] (base URL plus
//! token); there is no process-wide client. Non-2xx responses are mapped
//! back onto `taxon_core::Error` variants, so callers handle remote and
//! local failures the same way.
//!
//! # Example
//!
//! ```rust,no_run
//! use taxon_client::{ClientContext, TaxonClient};
//! use taxon_core::SubmitContentRequest;
//!
//! # async fn run() -> taxon_core::Result<()> {
//! let client = TaxonClient::new(ClientContext::new("http://localhost:8000", "my-token"))?;
//! let submitted = client
//!     .submit_text(&SubmitContentRequest {
//!         content: "The server is down".to_string(),
//!         title: String::new(),
//!         llm_provider: Some("deepseek".to_string()),
//!     })
//!     .await?;
//! println!("{} results", submitted.classification_results.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod context;
pub mod error;

pub use client::TaxonClient;
pub use context::ClientContext;
pub use error::error_from_response;
