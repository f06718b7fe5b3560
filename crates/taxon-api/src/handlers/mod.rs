//! HTTP handlers for taxon-api.
//!
//! Every `/api` handler takes the [`RequireAuth`](crate::auth::RequireAuth)
//! extractor; the health check does not.

pub mod category_groups;
pub mod contents;
pub mod dashboard;
pub mod email_rules;
pub mod results;

use axum::response::IntoResponse;
use axum::Json;

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
