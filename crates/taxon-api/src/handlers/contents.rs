//! Content submission and history handlers (text, uploaded files, email files).
//!
//! Content is private to its owner: every read and delete is scoped to the
//! requesting user's token fingerprint, and foreign ids read as not found.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use taxon_classify::{extract_email, extract_file, ExtractedContent};
use taxon_core::{
    defaults, total_pages, ClassificationResult, ContentItem, ContentKind, ContentWithResults,
    ListContentRequest, NewContentItem, PaginatedContent, ProviderList, SubmitContentRequest,
};

use crate::auth::RequireAuth;
use crate::{ApiError, AppState};

/// Query parameters for paginated history.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub async fn list_providers(
    State(state): State<AppState>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let providers = state.catalog.list_providers().await?;
    Ok(Json(ProviderList { providers }))
}

pub async fn list_texts(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        list_history(&state, &auth.user, ContentKind::Text, query).await?,
    ))
}

pub async fn list_files(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        list_history(&state, &auth.user, ContentKind::File, query).await?,
    ))
}

pub async fn list_emails(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        list_history(&state, &auth.user, ContentKind::Email, query).await?,
    ))
}

pub async fn submit_text(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<SubmitContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = resolve_provider(&state, req.llm_provider.as_deref());
    let title = if req.title.trim().is_empty() {
        default_title(&req.content)
    } else {
        req.title.trim().to_string()
    };

    let submitted = state
        .coordinator
        .submit(NewContentItem::text(title, req.content, &auth.user), &provider)
        .await?;
    log_submission(&submitted, &provider);
    Ok((StatusCode::CREATED, Json(submitted)))
}

pub async fn get_text(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let item = owned_item(&state, &auth.user, id).await?;
    let classification_results = state.results.list_for_content(item.id).await?;
    Ok(Json(ContentWithResults {
        item,
        classification_results,
    }))
}

pub async fn delete_text(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    owned_item(&state, &auth.user, id).await?;
    state.contents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_file(
    State(state): State<AppState>,
    auth: RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart, state.max_upload_bytes).await?;
    let extracted = extract_file(&upload.filename, &upload.data)?;
    submit_upload(&state, &auth.user, ContentKind::File, extracted, upload.llm_provider).await
}

pub async fn upload_email(
    State(state): State<AppState>,
    auth: RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart, state.max_upload_bytes).await?;
    let extracted = extract_email(&upload.filename, &upload.data)?;
    submit_upload(&state, &auth.user, ContentKind::Email, extracted, upload.llm_provider).await
}

// =============================================================================
// HELPERS
// =============================================================================

fn resolve_provider(state: &AppState, requested: Option<&str>) -> String {
    requested
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(state.default_provider.as_str())
        .to_string()
}

/// First line of the content, capped at 50 characters.
fn default_title(content: &str) -> String {
    let first_line = content.lines().map(str::trim).find(|l| !l.is_empty());
    match first_line {
        Some(line) => line.chars().take(50).collect(),
        None => "Untitled".to_string(),
    }
}

fn log_submission(submitted: &ContentWithResults, provider: &str) {
    info!(
        subsystem = "api",
        component = "contents",
        op = "submit",
        content_id = %submitted.item.id,
        content_kind = %submitted.item.kind,
        provider,
        result_count = submitted.classification_results.len(),
        "Content submitted"
    );
}

async fn owned_item(state: &AppState, user: &str, id: Uuid) -> Result<ContentItem, ApiError> {
    let item = state.contents.get(id).await?;
    if item.created_by != user {
        return Err(ApiError::NotFound(format!("Not found: content item {}", id)));
    }
    Ok(item)
}

async fn list_history(
    state: &AppState,
    user: &str,
    kind: ContentKind,
    query: PageQuery,
) -> Result<PaginatedContent, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(defaults::PAGE_SIZE)
        .clamp(1, defaults::PAGE_SIZE_MAX);

    // A page past i64::MAX rows is simply past the end.
    let offset = (page - 1)
        .checked_mul(page_size)
        .and_then(|o| i64::try_from(o).ok())
        .unwrap_or(i64::MAX);
    let limit = i64::try_from(page_size).unwrap_or(i64::MAX);

    let listed = state
        .contents
        .list(ListContentRequest {
            kind: Some(kind),
            created_by: Some(user.to_string()),
            limit,
            offset,
        })
        .await?;

    let count = listed.total.max(0) as usize;
    let pages = total_pages(count, page_size);
    let results = attach_results(state, listed.items).await?;

    Ok(PaginatedContent {
        count,
        total_pages: pages,
        next: (page < pages).then_some(page + 1),
        previous: (page > 1).then(|| page - 1),
        results,
    })
}

async fn attach_results(
    state: &AppState,
    items: Vec<ContentItem>,
) -> Result<Vec<ContentWithResults>, ApiError> {
    let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let mut by_content: HashMap<Uuid, Vec<ClassificationResult>> = HashMap::new();
    for result in state.results.list_for_contents(&ids).await? {
        by_content.entry(result.content_id).or_default().push(result);
    }

    Ok(items
        .into_iter()
        .map(|item| {
            let classification_results = by_content.remove(&item.id).unwrap_or_default();
            ContentWithResults {
                item,
                classification_results,
            }
        })
        .collect())
}

struct Upload {
    filename: String,
    data: Vec<u8>,
    llm_provider: Option<String>,
}

/// Read the `file` part (plus optional `llm_provider`) of a multipart form.
async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<Upload, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut llm_provider = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" | "email_file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "upload".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                if data.len() > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File exceeds the {} byte upload limit",
                        max_bytes
                    )));
                }
                file = Some((filename, data.to_vec()));
            }
            "llm_provider" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid llm_provider: {}", e)))?;
                llm_provider = Some(value);
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;
    Ok(Upload {
        filename,
        data,
        llm_provider,
    })
}

async fn submit_upload(
    state: &AppState,
    user: &str,
    kind: ContentKind,
    extracted: ExtractedContent,
    requested_provider: Option<String>,
) -> Result<(StatusCode, Json<ContentWithResults>), ApiError> {
    let provider = resolve_provider(state, requested_provider.as_deref());
    let submitted = state
        .coordinator
        .submit(extracted.into_new_item(kind, user), &provider)
        .await?;
    log_submission(&submitted, &provider);
    Ok((StatusCode::CREATED, Json(submitted)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_title_uses_first_line() {
        assert_eq!(default_title("\n  Server down\nmore"), "Server down");
        assert_eq!(default_title("   "), "Untitled");
        assert_eq!(default_title(&"a".repeat(80)).len(), 50);
    }
}
