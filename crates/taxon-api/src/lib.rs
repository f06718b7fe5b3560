//! # taxon-api
//!
//! HTTP surface of the taxon classification service.
//!
//! The router is built from an explicit [`AppState`] so the same wiring
//! serves the binary (PostgreSQL or in-memory store) and the router tests.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use uuid::Uuid;

use handlers::{category_groups, contents, dashboard, email_rules, results};

/// Room for multipart boundaries and the non-file form fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// OPENAPI
// =============================================================================

/// OpenAPI document served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Taxon API",
        description = "Category-group content classification with pluggable LLM providers"
    ),
    components(schemas(
        taxon_core::Category,
        taxon_core::CategoryGroup,
        taxon_core::CategoryInput,
        taxon_core::CategoryGroupInput,
        taxon_core::ToggleActiveResponse,
        taxon_core::ContentKind,
        taxon_core::ContentItem,
        taxon_core::SubmitContentRequest,
        taxon_core::ResultStatus,
        taxon_core::ResultMetadata,
        taxon_core::ClassificationResult,
        taxon_core::ContentWithResults,
        taxon_core::PaginatedContent,
        taxon_core::ProviderList,
        taxon_core::PeriodStats,
        taxon_core::LabelCount,
        taxon_core::DashboardStats,
        taxon_core::RuleConditions,
        taxon_core::EmailRule,
        taxon_core::EmailRuleInput,
        taxon_core::AttachmentSample,
        taxon_core::EmailSample,
        taxon_core::TestRuleRequest,
        taxon_core::RuleEvaluation,
        taxon_core::RuleMatch,
    )),
    tags(
        (name = "Category Groups", description = "Category group and category management"),
        (name = "Content", description = "Text, file, and email submission and history"),
        (name = "Results", description = "Classification result history"),
        (name = "Email Rules", description = "Email classification rules and dry runs"),
        (name = "Dashboard", description = "Per-user statistics"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// =============================================================================
// CORS
// =============================================================================

/// Parse the CORS whitelist from `ALLOWED_ORIGINS` (comma separated).
///
/// Falls back to `http://localhost:3000` when unset or empty. Invalid
/// entries are skipped with a warning.
pub fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str =
        std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());

    if origins_str.trim().is_empty() {
        return vec![HeaderValue::from_static("http://localhost:3000")];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(openapi_json))
        // Category groups
        .route(
            "/api/classifier/category-groups/",
            get(category_groups::list_groups).post(category_groups::create_group),
        )
        .route(
            "/api/classifier/category-groups/:id/",
            get(category_groups::get_group)
                .put(category_groups::update_group)
                .delete(category_groups::delete_group),
        )
        .route(
            "/api/classifier/category-groups/:id/toggle_active/",
            post(category_groups::toggle_active),
        )
        .route(
            "/api/classifier/category-groups/:id/categories/",
            get(category_groups::list_categories).post(category_groups::add_category),
        )
        // Results
        .route("/api/classifier/results/", get(results::list_results))
        .route("/api/classifier/results/:id/", get(results::get_result))
        // Content
        .route("/api/files/llm-providers/", get(contents::list_providers))
        .route(
            "/api/files/text/",
            get(contents::list_texts).post(contents::submit_text),
        )
        .route(
            "/api/files/text/:id/",
            get(contents::get_text).delete(contents::delete_text),
        )
        .route("/api/files/upload/", post(contents::upload_file))
        .route("/api/files/files/", get(contents::list_files))
        .route(
            "/api/email/email-files/",
            get(contents::list_emails).post(contents::upload_email),
        )
        // Email rules
        .route(
            "/api/email/email-rules/",
            get(email_rules::list_rules).post(email_rules::create_rule),
        )
        .route(
            "/api/email/email-rules/test_rule/",
            post(email_rules::test_rule),
        )
        .route(
            "/api/email/email-rules/evaluate/",
            post(email_rules::evaluate_rules),
        )
        .route(
            "/api/email/email-rules/:id/",
            get(email_rules::get_rule)
                .put(email_rules::update_rule)
                .delete(email_rules::delete_rule),
        )
        // Dashboard
        .route("/api/dashboard/", get(dashboard::dashboard))
        .route("/api/stats/", get(dashboard::stats))
        // Middleware
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_uuid_v7() {
        let request = axum::http::Request::new(());
        let id = MakeRequestUuidV7
            .make_request_id(&request)
            .expect("request id");
        let parsed: Uuid = id.header_value().to_str().unwrap().parse().unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn test_openapi_lists_core_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("CategoryGroup"));
        assert!(schemas.contains_key("PaginatedContent"));
    }
}
