//! Dashboard statistics queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use taxon_core::{Error, LabelCount, PeriodStats, Result, StatsRepository};

/// PostgreSQL implementation of StatsRepository.
#[derive(Clone)]
pub struct PgStatsRepository {
    pool: Pool<Postgres>,
}

impl PgStatsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    async fn counts_since(&self, created_by: &str, since: DateTime<Utc>) -> Result<PeriodStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM classification_result
                  WHERE created_by = $1 AND created_at_utc >= $2) AS classifications,
                (SELECT COUNT(*) FROM content_item
                  WHERE created_by = $1 AND created_at_utc >= $2 AND kind = 'email') AS emails,
                (SELECT COUNT(*) FROM content_item
                  WHERE created_by = $1 AND created_at_utc >= $2 AND kind = 'file') AS files,
                (SELECT COUNT(*) FROM content_item
                  WHERE created_by = $1 AND created_at_utc >= $2 AND kind = 'text') AS texts
            "#,
        )
        .bind(created_by)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(PeriodStats {
            classifications: row.get("classifications"),
            emails: row.get("emails"),
            files: row.get("files"),
            texts: row.get("texts"),
        })
    }

    async fn label_distribution(&self, created_by: &str, limit: i64) -> Result<Vec<LabelCount>> {
        let rows = sqlx::query(
            r#"
            SELECT classification, COUNT(*) AS count
            FROM classification_result
            WHERE created_by = $1
            GROUP BY classification
            ORDER BY count DESC, classification
            LIMIT $2
            "#,
        )
        .bind(created_by)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| LabelCount {
                classification: r.get("classification"),
                count: r.get("count"),
            })
            .collect())
    }
}
