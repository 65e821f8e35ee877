//! Database migration functionality
//!
//! Creates the catalog table and its indexes for the PostgreSQL backend.

use crate::core::CatalogHaus;
use crate::errors::CatalogError;
use store_object::PostgresStore;

impl CatalogHaus {
    /// Create the catalog table and indexes if they do not exist
    /// If recreate is true, drops the existing table first
    ///
    /// Does nothing for the in-memory backend.
    pub async fn auto_migrate(&self, recreate: bool) -> Result<(), CatalogError> {
        let Some(pool) = self.pool() else {
            tracing::debug!("in-memory repository, nothing to migrate");
            return Ok(());
        };
        let table_name = PostgresStore::table_name();

        if recreate {
            tracing::info!(table = table_name, "dropping table");
            sqlx::query(PostgresStore::drop_table_sql())
                .execute(pool)
                .await?;
        }

        tracing::info!(table = table_name, "creating table");
        sqlx::query(PostgresStore::create_table_sql())
            .execute(pool)
            .await?;

        for index_sql in PostgresStore::create_indexes_sql() {
            tracing::debug!(table = table_name, sql = *index_sql, "creating index");
            sqlx::query(index_sql).execute(pool).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::AppConfig;

    #[tokio::test]
    async fn memory_backend_migration_is_noop() {
        let haus = CatalogHaus::new(AppConfig::default()).await.unwrap();
        haus.auto_migrate(true).await.unwrap();
    }
}
