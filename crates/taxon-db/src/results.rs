//! Classification result repository implementation.
//!
//! Results are append-only. The stored columns flatten `ResultMetadata`.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use taxon_core::{
    ClassificationResult, ClassificationResultRepository, Error, Result, ResultMetadata,
    ResultStatus,
};

use crate::contents::parse_kind;

const RESULT_COLUMNS: &str = "id, content_id, content_type, content_hash, classification, \
                              confidence, explanation, category_group_id, category_group_name, \
                              status, raw_label, llm_provider, llm_model, created_by, \
                              created_at_utc";

/// PostgreSQL implementation of ClassificationResultRepository.
#[derive(Clone)]
pub struct PgClassificationResultRepository {
    pool: Pool<Postgres>,
}

impl PgClassificationResultRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn parse_status(raw: &str) -> Result<ResultStatus> {
    match raw {
        "classified" => Ok(ResultStatus::Classified),
        "unclassified" => Ok(ResultStatus::Unclassified),
        "error" => Ok(ResultStatus::Error),
        other => Err(Error::Internal(format!("unknown result status: {}", other))),
    }
}

fn result_from_row(row: &PgRow) -> Result<ClassificationResult> {
    let content_type: String = row.get("content_type");
    let status: String = row.get("status");
    Ok(ClassificationResult {
        id: row.get("id"),
        content_id: row.get("content_id"),
        content_type: parse_kind(&content_type)?,
        content_hash: row.get("content_hash"),
        classification: row.get("classification"),
        confidence: row.get("confidence"),
        metadata: ResultMetadata {
            explanation: row.get("explanation"),
            category_group_name: row.get("category_group_name"),
            category_group_id: row.get("category_group_id"),
            status: parse_status(&status)?,
            raw_label: row.get("raw_label"),
        },
        llm_provider: row.get("llm_provider"),
        llm_model: row.get("llm_model"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at_utc"),
    })
}

fn results_from_rows(rows: &[PgRow]) -> Result<Vec<ClassificationResult>> {
    rows.iter().map(result_from_row).collect()
}

#[async_trait]
impl ClassificationResultRepository for PgClassificationResultRepository {
    async fn insert_batch(&self, results: &[ClassificationResult]) -> Result<()> {
        if results.is_empty() {
            return Ok(());
        }

        // A group deleted while its call was in flight is stored like any
        // later delete: name kept, id null.
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        for (position, result) in results.iter().enumerate() {
            sqlx::query(
                "INSERT INTO classification_result
                    (id, content_id, content_type, content_hash, classification, confidence,
                     explanation, category_group_id, category_group_name, status, raw_label,
                     position, llm_provider, llm_model, created_by, created_at_utc)
                 VALUES ($1, $2, $3, $4, $5, $6, $7,
                         (SELECT id FROM category_group WHERE id = $8),
                         $9, $10, $11, $12, $13, $14, $15, $16)",
            )
            .bind(result.id)
            .bind(result.content_id)
            .bind(result.content_type.as_str())
            .bind(&result.content_hash)
            .bind(&result.classification)
            .bind(result.confidence.clamp(0.0, 1.0))
            .bind(&result.metadata.explanation)
            .bind(result.metadata.category_group_id)
            .bind(&result.metadata.category_group_name)
            .bind(result.metadata.status.as_str())
            .bind(result.metadata.raw_label.as_deref())
            .bind(position as i32)
            .bind(&result.llm_provider)
            .bind(&result.llm_model)
            .bind(&result.created_by)
            .bind(result.created_at)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "results",
            op = "insert_batch",
            result_count = results.len(),
            "Stored classification results"
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<ClassificationResult> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM classification_result WHERE id = $1",
            RESULT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("classification result {}", id)))?;

        result_from_row(&row)
    }

    async fn list_for_content(&self, content_id: Uuid) -> Result<Vec<ClassificationResult>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM classification_result WHERE content_id = $1 ORDER BY position",
            RESULT_COLUMNS
        ))
        .bind(content_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        results_from_rows(&rows)
    }

    async fn list_for_contents(&self, content_ids: &[Uuid]) -> Result<Vec<ClassificationResult>> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {} FROM classification_result
             WHERE content_id = ANY($1)
             ORDER BY content_id, position",
            RESULT_COLUMNS
        ))
        .bind(content_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        results_from_rows(&rows)
    }

    async fn list(
        &self,
        created_by: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClassificationResult>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM classification_result
             WHERE ($1::text IS NULL OR created_by = $1)
             ORDER BY created_at_utc DESC, id DESC
             LIMIT $2 OFFSET $3",
            RESULT_COLUMNS
        ))
        .bind(created_by)
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        results_from_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_roundtrip() {
        for status in [
            ResultStatus::Classified,
            ResultStatus::Unclassified,
            ResultStatus::Error,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
        assert!(parse_status("pending").is_err());
    }
}
