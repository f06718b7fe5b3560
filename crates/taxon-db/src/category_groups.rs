//! Category group repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use taxon_core::{
    new_v7, validate_category_name, validate_group_input, Category, CategoryGroup,
    CategoryGroupInput, CategoryGroupRepository, CategoryInput, Error, Result,
};

use crate::map_unique_violation;

const GROUP_COLUMNS: &str =
    "id, name, description, is_active, created_by, created_at_utc, updated_at_utc";

/// PostgreSQL implementation of CategoryGroupRepository.
#[derive(Clone)]
pub struct PgCategoryGroupRepository {
    pool: Pool<Postgres>,
}

impl PgCategoryGroupRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open a read transaction that sees one snapshot for every statement.
    async fn snapshot(&self) -> Result<Transaction<'_, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        Ok(tx)
    }

    async fn fetch_groups(&self, active_only: bool) -> Result<Vec<CategoryGroup>> {
        let mut tx = self.snapshot().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM category_group WHERE ($1 = FALSE OR is_active) \
             ORDER BY created_at_utc, id",
            GROUP_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();
        let mut categories = load_categories(&mut tx, &ids).await?;
        tx.commit().await.map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                group_from_row(row, categories.remove(&id).unwrap_or_default())
            })
            .collect())
    }
}

/// Load categories for a set of groups in one query, keyed by group id.
async fn load_categories(
    tx: &mut Transaction<'_, Postgres>,
    group_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Category>>> {
    if group_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(
        r#"
        SELECT id, group_id, name, description, created_at_utc
        FROM category
        WHERE group_id = ANY($1)
        ORDER BY group_id, position
        "#,
    )
    .bind(group_ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(Error::Database)?;

    let mut by_group: HashMap<Uuid, Vec<Category>> = HashMap::new();
    for row in rows {
        let group_id: Uuid = row.get("group_id");
        by_group.entry(group_id).or_default().push(category_from_row(&row));
    }
    Ok(by_group)
}

fn category_from_row(row: &PgRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at_utc"),
    }
}

fn group_from_row(row: &PgRow, categories: Vec<Category>) -> CategoryGroup {
    CategoryGroup {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        is_active: row.get("is_active"),
        categories,
        created_by: row.get("created_by"),
        created_at: row.get("created_at_utc"),
        updated_at: row.get("updated_at_utc"),
    }
}

/// Insert categories for a group starting at `position`.
async fn insert_categories(
    tx: &mut Transaction<'_, Postgres>,
    group_id: Uuid,
    categories: &[CategoryInput],
    start_position: i32,
) -> Result<()> {
    let now = Utc::now();
    for (i, category) in categories.iter().enumerate() {
        sqlx::query(
            "INSERT INTO category (id, group_id, name, description, position, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(new_v7())
        .bind(group_id)
        .bind(category.name.trim())
        .bind(category.description.as_deref().unwrap_or(""))
        .bind(start_position + i as i32)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_unique_violation(e, &category.name))?;
    }
    Ok(())
}

#[async_trait]
impl CategoryGroupRepository for PgCategoryGroupRepository {
    async fn list(&self) -> Result<Vec<CategoryGroup>> {
        self.fetch_groups(false).await
    }

    async fn list_active(&self) -> Result<Vec<CategoryGroup>> {
        self.fetch_groups(true).await
    }

    async fn get(&self, id: Uuid) -> Result<CategoryGroup> {
        let mut tx = self.snapshot().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM category_group WHERE id = $1",
            GROUP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("category group {}", id)))?;

        let mut categories = load_categories(&mut tx, &[id]).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(group_from_row(
            &row,
            categories.remove(&id).unwrap_or_default(),
        ))
    }

    async fn create(&self, input: CategoryGroupInput, created_by: &str) -> Result<CategoryGroup> {
        validate_group_input(&input)?;

        let id = new_v7();
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO category_group
                (id, name, description, is_active, created_by, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, TRUE, $4, $5, $5)",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.description.as_deref().unwrap_or(""))
        .bind(created_by)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        insert_categories(&mut tx, id, &input.categories, 0).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "category_groups",
            op = "create",
            group_id = %id,
            category_count = input.categories.len(),
            "Created category group"
        );
        self.get(id).await
    }

    async fn update(&self, id: Uuid, input: CategoryGroupInput) -> Result<CategoryGroup> {
        validate_group_input(&input)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let updated = sqlx::query(
            "UPDATE category_group
             SET name = $2, description = $3, updated_at_utc = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.description.as_deref().unwrap_or(""))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::NotFound(format!("category group {}", id)));
        }

        // Full replacement, never a merge.
        sqlx::query("DELETE FROM category WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        insert_categories(&mut tx, id, &input.categories, 0).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "category_groups",
            op = "update",
            group_id = %id,
            category_count = input.categories.len(),
            "Replaced category group"
        );
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Results keep category_group_name; the FK nulls category_group_id.
        let deleted = sqlx::query("DELETE FROM category_group WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound(format!("category group {}", id)));
        }

        info!(
            subsystem = "db",
            component = "category_groups",
            op = "delete",
            group_id = %id,
            "Deleted category group"
        );
        Ok(())
    }

    async fn toggle_active(&self, id: Uuid) -> Result<CategoryGroup> {
        let toggled = sqlx::query(
            "UPDATE category_group
             SET is_active = NOT is_active, updated_at_utc = $2
             WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if toggled.rows_affected() == 0 {
            return Err(Error::NotFound(format!("category group {}", id)));
        }
        self.get(id).await
    }

    async fn add_category(&self, group_id: Uuid, input: CategoryInput) -> Result<Category> {
        validate_category_name(&input.name)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Lock the group row so concurrent appends get distinct positions.
        sqlx::query("SELECT id FROM category_group WHERE id = $1 FOR UPDATE")
            .bind(group_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("category group {}", group_id)))?;

        let position: i32 = sqlx::query(
            "SELECT COALESCE(MAX(position) + 1, 0) AS next_position
             FROM category WHERE group_id = $1",
        )
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?
        .get("next_position");

        let id = new_v7();
        let row = sqlx::query(
            "INSERT INTO category (id, group_id, name, description, position, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, name, description, created_at_utc",
        )
        .bind(id)
        .bind(group_id)
        .bind(input.name.trim())
        .bind(input.description.as_deref().unwrap_or(""))
        .bind(position)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, &input.name))?;

        sqlx::query("UPDATE category_group SET updated_at_utc = $2 WHERE id = $1")
            .bind(group_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(category_from_row(&row))
    }

    async fn list_categories(&self, group_id: Uuid) -> Result<Vec<Category>> {
        Ok(self.get(group_id).await?.categories)
    }
}
