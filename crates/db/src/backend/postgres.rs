//! PostgreSQL backend for the `categories` table.

use async_trait::async_trait;
use hearth_core::category::CategoryType;
use hearth_core::error::{CoreError, ParentViolation};
use hearth_core::types::{DbId, Timestamp};
use sqlx::postgres::PgExecutor;
use sqlx::{PgPool, Postgres, Transaction};

use super::{ActiveFilter, CategoryBackend, FamilyTxn};
use crate::models::category::Category;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, type, color, icon, parent_id, family_id, is_active, created_at, updated_at";

/// PostgreSQL error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL error code for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Category storage backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CategoryBackend for PgBackend {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Category>, CoreError> {
        find_by_id(&self.pool, id).await
    }

    async fn list_active(&self, filter: &ActiveFilter) -> Result<Vec<Category>, CoreError> {
        list_active(&self.pool, filter).await
    }

    /// Starts a transaction holding an advisory lock on the family, so
    /// check-then-write sequences of concurrent writers never interleave.
    async fn begin(&self, family_id: DbId) -> Result<Box<dyn FamilyTxn>, CoreError> {
        let target = format!("family {family_id}");
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::storage("begin transaction", &target, e))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(family_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::storage("lock family", &target, e))?;

        Ok(Box::new(PgTxn { tx, family_id }))
    }
}

/// A transaction scoped to one family. Rolled back on drop.
struct PgTxn {
    tx: Transaction<'static, Postgres>,
    family_id: DbId,
}

#[async_trait]
impl FamilyTxn for PgTxn {
    async fn find_by_id(&mut self, id: DbId) -> Result<Option<Category>, CoreError> {
        find_by_id(&mut *self.tx, id).await
    }

    async fn active_categories(&mut self) -> Result<Vec<Category>, CoreError> {
        list_active(&mut *self.tx, &ActiveFilter::family(self.family_id)).await
    }

    async fn insert(&mut self, category: &Category) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO categories
                (id, name, type, color, icon, parent_id, family_id, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(category.category_type.as_str())
        .bind(&category.color)
        .bind(&category.icon)
        .bind(category.parent_id)
        .bind(category.family_id)
        .bind(category.is_active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| classify_write_error(e, "insert category", category))?;
        Ok(())
    }

    async fn update(&mut self, category: &Category) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "UPDATE categories SET
                name = $3,
                type = $4,
                color = $5,
                icon = $6,
                parent_id = $7,
                updated_at = $8
             WHERE id = $1 AND family_id = $2 AND is_active",
        )
        .bind(category.id)
        .bind(category.family_id)
        .bind(&category.name)
        .bind(category.category_type.as_str())
        .bind(&category.color)
        .bind(&category.icon)
        .bind(category.parent_id)
        .bind(category.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| classify_write_error(e, "update category", category))?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(
        &mut self,
        id: DbId,
        family_id: DbId,
        at: Timestamp,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "UPDATE categories SET is_active = FALSE, updated_at = $3
             WHERE id = $1 AND family_id = $2 AND is_active",
        )
        .bind(id)
        .bind(family_id)
        .bind(at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| CoreError::storage("deactivate category", format!("category {id}"), e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), CoreError> {
        let target = format!("family {}", self.family_id);
        self.tx
            .commit()
            .await
            .map_err(|e| CoreError::storage("commit", target, e))
    }
}

async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Category>, CoreError>
where
    E: PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
    sqlx::query_as::<_, Category>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| CoreError::storage("find category", format!("category {id}"), e))
}

async fn list_active<'e, E>(executor: E, filter: &ActiveFilter) -> Result<Vec<Category>, CoreError>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {COLUMNS} FROM categories
         WHERE family_id = $1 AND is_active AND ($2::text IS NULL OR type = $2)
         ORDER BY type, parent_id NULLS FIRST, name"
    );
    sqlx::query_as::<_, Category>(&query)
        .bind(filter.family_id)
        .bind(filter.category_type.map(CategoryType::as_str))
        .fetch_all(executor)
        .await
        .map_err(|e| {
            CoreError::storage("list categories", format!("family {}", filter.family_id), e)
        })
}

/// Classify a failed write.
///
/// - Unique violations on `uq_categories_family_name` / `categories_pkey`
///   become `DuplicateName` / `DuplicateId`.
/// - Foreign key violations on `parent_id` become `InvalidParent`.
/// - Everything else is wrapped as a storage error.
fn classify_write_error(err: sqlx::Error, operation: &'static str, category: &Category) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match (db_err.code().as_deref(), db_err.constraint()) {
            (Some(UNIQUE_VIOLATION), Some("uq_categories_family_name")) => {
                return CoreError::DuplicateName {
                    name: category.name.clone(),
                };
            }
            (Some(UNIQUE_VIOLATION), Some("categories_pkey")) => {
                return CoreError::DuplicateId { id: category.id };
            }
            (Some(FOREIGN_KEY_VIOLATION), _) => {
                if let Some(parent_id) = category.parent_id {
                    return CoreError::InvalidParent {
                        parent_id,
                        reason: ParentViolation::NotFound,
                    };
                }
            }
            _ => {}
        }
    }
    CoreError::storage(operation, format!("category {}", category.id), err)
}
