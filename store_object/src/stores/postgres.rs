//! PostgreSQL item repository
//!
//! Each operation is a single statement (or one read-only transaction for
//! listing), so PostgreSQL provides atomicity. The in-process keyed locks
//! still serialize same-SKU mutations issued through one store instance.

use crate::errors::RepositoryError;
use crate::locks::KeyedLocks;
use crate::model::{Item, ItemId, ItemPatch, NewItem};
use crate::pagination::{Page, PageLimits, Pagination};
use crate::traits::ItemRepository;
use crate::validation::{validate_price, validate_sku};
use crate::DbPool;
use async_trait::async_trait;

const TABLE_NAME: &str = "catalog_items";

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS catalog_items (
    id BIGSERIAL PRIMARY KEY,
    sku TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    price DOUBLE PRECISION NOT NULL CHECK (price >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const CREATE_INDEXES_SQL: &[&str] =
    &["CREATE INDEX IF NOT EXISTS catalog_items_category_idx ON catalog_items (category, id)"];

const DROP_TABLE_SQL: &str = "DROP TABLE IF EXISTS catalog_items";

const COLUMNS: &str = "id, sku, name, category, price, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: DbPool,
    locks: std::sync::Arc<KeyedLocks>,
    limits: PageLimits,
}

impl PostgresStore {
    pub fn new(pool: DbPool, limits: PageLimits) -> Self {
        Self {
            pool,
            locks: std::sync::Arc::new(KeyedLocks::new()),
            limits,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn table_name() -> &'static str {
        TABLE_NAME
    }

    pub fn create_table_sql() -> &'static str {
        CREATE_TABLE_SQL
    }

    pub fn create_indexes_sql() -> &'static [&'static str] {
        CREATE_INDEXES_SQL
    }

    pub fn drop_table_sql() -> &'static str {
        DROP_TABLE_SQL
    }

    async fn fetch_by_sku(&self, sku: &str) -> Result<Option<Item>, RepositoryError> {
        let sql = format!("SELECT {} FROM {} WHERE sku = $1", COLUMNS, TABLE_NAME);
        Ok(sqlx::query_as::<_, Item>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl ItemRepository for PostgresStore {
    async fn create(&self, item: NewItem) -> Result<Item, RepositoryError> {
        validate_sku(&item.sku)?;
        validate_price(item.price)?;

        let _guard = self.locks.lock(&item.sku).await;
        let sql = format!(
            "INSERT INTO {} (sku, name, category, price) VALUES ($1, $2, $3, $4)
             ON CONFLICT (sku) DO NOTHING
             RETURNING {}",
            TABLE_NAME, COLUMNS
        );
        let created = sqlx::query_as::<_, Item>(&sql)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(&item.category)
            .bind(item.price)
            .fetch_optional(&self.pool)
            .await?;

        match created {
            Some(created) => {
                tracing::debug!(id = created.id, sku = %created.sku, "created item");
                Ok(created)
            }
            None => Err(RepositoryError::DuplicateSku(item.sku)),
        }
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Item, RepositoryError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", COLUMNS, TABLE_NAME);
        sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::item_not_found(id))
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Item, RepositoryError> {
        self.fetch_by_sku(sku)
            .await?
            .ok_or_else(|| RepositoryError::sku_not_found(sku))
    }

    async fn list(&self, pagination: &Pagination) -> Result<Page<Item>, RepositoryError> {
        let limit = self.limits.resolve(pagination.limit);
        let offset = i64::try_from(pagination.offset).unwrap_or(i64::MAX);

        // One snapshot for both the count and the page
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE ($1::TEXT IS NULL OR category = $1)",
            TABLE_NAME
        );
        let total_count: i64 = sqlx::query_scalar(&count_sql)
            .bind(pagination.category.as_deref())
            .fetch_one(&mut *tx)
            .await?;

        let page_sql = format!(
            "SELECT {} FROM {} WHERE ($1::TEXT IS NULL OR category = $1)
             ORDER BY id ASC LIMIT $2 OFFSET $3",
            COLUMNS, TABLE_NAME
        );
        let items = sqlx::query_as::<_, Item>(&page_sql)
            .bind(pagination.category.as_deref())
            .bind(i64::from(limit))
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Page {
            items,
            total_count: total_count.max(0) as u64,
            offset: pagination.offset,
            limit,
        })
    }

    async fn apply_patch(&self, sku: &str, patch: ItemPatch) -> Result<Item, RepositoryError> {
        if let Some(price) = patch.price {
            validate_price(price)?;
        }

        let _guard = self.locks.lock(sku).await;
        // Only rows that actually change are updated, so reapplying a patch
        // leaves updated_at alone
        let sql = format!(
            "UPDATE {table} SET
                price = COALESCE($2, price),
                name = COALESCE($3, name),
                category = COALESCE($4, category),
                updated_at = NOW()
             WHERE sku = $1 AND (
                price IS DISTINCT FROM COALESCE($2, price)
                OR name IS DISTINCT FROM COALESCE($3, name)
                OR category IS DISTINCT FROM COALESCE($4, category)
             )
             RETURNING {columns}",
            table = TABLE_NAME,
            columns = COLUMNS
        );
        let updated = sqlx::query_as::<_, Item>(&sql)
            .bind(sku)
            .bind(patch.price)
            .bind(patch.name.as_deref())
            .bind(patch.category.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(updated) => {
                tracing::debug!(id = updated.id, sku, "patched item");
                Ok(updated)
            }
            // Either a no-op patch or an unknown SKU
            None => self
                .fetch_by_sku(sku)
                .await?
                .ok_or_else(|| RepositoryError::sku_not_found(sku)),
        }
    }

    async fn delete(&self, sku: &str) -> Result<Item, RepositoryError> {
        let _guard = self.locks.lock(sku).await;
        let sql = format!(
            "DELETE FROM {} WHERE sku = $1 RETURNING {}",
            TABLE_NAME, COLUMNS
        );
        let removed = sqlx::query_as::<_, Item>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::sku_not_found(sku))?;

        tracing::debug!(id = removed.id, sku, "deleted item");
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM {}", TABLE_NAME);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    fn page_limits(&self) -> PageLimits {
        self.limits
    }
}
