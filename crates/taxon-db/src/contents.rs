//! Content item repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use taxon_core::{
    defaults, new_v7, ContentItem, ContentKind, ContentRepository, Error, ListContentRequest,
    ListContentResponse, NewContentItem, Result,
};

const CONTENT_COLUMNS: &str = "id, kind, title, content, processed, llm_provider, llm_model, \
                               metadata, created_by, created_at_utc, updated_at_utc";

/// PostgreSQL implementation of ContentRepository.
#[derive(Clone)]
pub struct PgContentRepository {
    pool: Pool<Postgres>,
}

impl PgContentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_kind(raw: &str) -> Result<ContentKind> {
    raw.parse::<ContentKind>().map_err(Error::Internal)
}

fn content_from_row(row: &PgRow) -> Result<ContentItem> {
    let kind: String = row.get("kind");
    Ok(ContentItem {
        id: row.get("id"),
        kind: parse_kind(&kind)?,
        title: row.get("title"),
        content: row.get("content"),
        processed: row.get("processed"),
        llm_provider: row.get("llm_provider"),
        llm_model: row.get("llm_model"),
        metadata: row.get("metadata"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at_utc"),
        updated_at: row.get("updated_at_utc"),
    })
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn insert(&self, item: NewContentItem) -> Result<ContentItem> {
        let row = sqlx::query(&format!(
            "INSERT INTO content_item
                (id, kind, title, content, processed, llm_provider, llm_model,
                 metadata, created_by, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, FALSE, $5, $5, $6, $7, $8, $8)
             RETURNING {}",
            CONTENT_COLUMNS
        ))
        .bind(new_v7())
        .bind(item.kind.as_str())
        .bind(&item.title)
        .bind(&item.content)
        .bind(defaults::UNKNOWN)
        .bind(&item.metadata)
        .bind(&item.created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let stored = content_from_row(&row)?;
        debug!(
            subsystem = "db",
            component = "contents",
            op = "insert",
            content_id = %stored.id,
            content_kind = %stored.kind,
            "Stored content item"
        );
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<ContentItem> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM content_item WHERE id = $1",
            CONTENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("content item {}", id)))?;

        content_from_row(&row)
    }

    async fn list(&self, req: ListContentRequest) -> Result<ListContentResponse> {
        let kind = req.kind.map(|k| k.as_str());
        let created_by = req.created_by.as_deref();

        let total: i64 = sqlx::query(
            "SELECT COUNT(*) AS total FROM content_item
             WHERE ($1::text IS NULL OR kind = $1)
               AND ($2::text IS NULL OR created_by = $2)",
        )
        .bind(kind)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?
        .get("total");

        let rows = sqlx::query(&format!(
            "SELECT {} FROM content_item
             WHERE ($1::text IS NULL OR kind = $1)
               AND ($2::text IS NULL OR created_by = $2)
             ORDER BY created_at_utc DESC, id DESC
             LIMIT $3 OFFSET $4",
            CONTENT_COLUMNS
        ))
        .bind(kind)
        .bind(created_by)
        .bind(req.limit.max(0))
        .bind(req.offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let items = rows
            .iter()
            .map(content_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(ListContentResponse { items, total })
    }

    async fn mark_processed(&self, id: Uuid, llm_provider: &str, llm_model: &str) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE content_item
             SET processed = TRUE, llm_provider = $2, llm_model = $3, updated_at_utc = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(llm_provider)
        .bind(llm_model)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::NotFound(format!("content item {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM content_item WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound(format!("content item {}", id)));
        }
        Ok(())
    }
}
