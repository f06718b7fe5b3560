//! Email rule repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use taxon_core::{
    new_v7, normalize_rule_conditions, validate_email_rule_input, EmailRule, EmailRuleInput,
    EmailRuleRepository, Error, Result, RuleConditions,
};

const RULE_COLUMNS: &str = "id, name, description, sender_domains, subject_keywords, \
                            body_keywords, min_attachments, max_attachments, \
                            min_attachment_size, max_attachment_size, classification, \
                            priority, is_active, created_at_utc, updated_at_utc";

const RULE_ORDER: &str = "ORDER BY priority DESC, created_at_utc, id";

/// PostgreSQL implementation of EmailRuleRepository.
#[derive(Clone)]
pub struct PgEmailRuleRepository {
    pool: Pool<Postgres>,
}

impl PgEmailRuleRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_rules(&self, active_only: bool) -> Result<Vec<EmailRule>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM email_rule WHERE ($1 = FALSE OR is_active) {}",
            RULE_COLUMNS, RULE_ORDER
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(rule_from_row).collect())
    }
}

fn rule_from_row(row: &PgRow) -> EmailRule {
    EmailRule {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        conditions: RuleConditions {
            sender_domains: row.get("sender_domains"),
            subject_keywords: row.get("subject_keywords"),
            body_keywords: row.get("body_keywords"),
            min_attachments: row.get("min_attachments"),
            max_attachments: row.get("max_attachments"),
            min_attachment_size: row.get("min_attachment_size"),
            max_attachment_size: row.get("max_attachment_size"),
        },
        classification: row.get("classification"),
        priority: row.get("priority"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at_utc"),
        updated_at: row.get("updated_at_utc"),
    }
}

#[async_trait]
impl EmailRuleRepository for PgEmailRuleRepository {
    async fn list(&self) -> Result<Vec<EmailRule>> {
        self.fetch_rules(false).await
    }

    async fn list_active(&self) -> Result<Vec<EmailRule>> {
        self.fetch_rules(true).await
    }

    async fn get(&self, id: Uuid) -> Result<EmailRule> {
        let row = sqlx::query(&format!("SELECT {} FROM email_rule WHERE id = $1", RULE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("email rule {}", id)))?;
        Ok(rule_from_row(&row))
    }

    async fn create(&self, input: EmailRuleInput) -> Result<EmailRule> {
        validate_email_rule_input(&input)?;
        let conditions = normalize_rule_conditions(&input.conditions);
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "INSERT INTO email_rule
                (id, name, description, sender_domains, subject_keywords, body_keywords,
                 min_attachments, max_attachments, min_attachment_size, max_attachment_size,
                 classification, priority, is_active, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
             RETURNING {}",
            RULE_COLUMNS
        ))
        .bind(new_v7())
        .bind(input.name.trim())
        .bind(input.description.as_deref().unwrap_or(""))
        .bind(&conditions.sender_domains)
        .bind(&conditions.subject_keywords)
        .bind(&conditions.body_keywords)
        .bind(conditions.min_attachments)
        .bind(conditions.max_attachments)
        .bind(conditions.min_attachment_size)
        .bind(conditions.max_attachment_size)
        .bind(input.classification.trim())
        .bind(input.priority)
        .bind(input.is_active)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let rule = rule_from_row(&row);
        info!(
            subsystem = "db",
            component = "email_rules",
            op = "create",
            rule_id = %rule.id,
            priority = rule.priority,
            "Created email rule"
        );
        Ok(rule)
    }

    async fn update(&self, id: Uuid, input: EmailRuleInput) -> Result<EmailRule> {
        validate_email_rule_input(&input)?;
        let conditions = normalize_rule_conditions(&input.conditions);

        let row = sqlx::query(&format!(
            "UPDATE email_rule
             SET name = $2, description = $3, sender_domains = $4, subject_keywords = $5,
                 body_keywords = $6, min_attachments = $7, max_attachments = $8,
                 min_attachment_size = $9, max_attachment_size = $10, classification = $11,
                 priority = $12, is_active = $13, updated_at_utc = $14
             WHERE id = $1
             RETURNING {}",
            RULE_COLUMNS
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(input.description.as_deref().unwrap_or(""))
        .bind(&conditions.sender_domains)
        .bind(&conditions.subject_keywords)
        .bind(&conditions.body_keywords)
        .bind(conditions.min_attachments)
        .bind(conditions.max_attachments)
        .bind(conditions.min_attachment_size)
        .bind(conditions.max_attachment_size)
        .bind(input.classification.trim())
        .bind(input.priority)
        .bind(input.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("email rule {}", id)))?;

        Ok(rule_from_row(&row))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM email_rule WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound(format!("email rule {}", id)));
        }
        info!(
            subsystem = "db",
            component = "email_rules",
            op = "delete",
            rule_id = %id,
            "Deleted email rule"
        );
        Ok(())
    }
}
