//! Core CatalogHaus functionality
//!
//! This module contains the main CatalogHaus struct and its implementation,
//! wiring configuration into a repository backend, the response cache and
//! the token service, and handing out the request orchestrator.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::CatalogError;
use crate::service::CatalogService;
use auth_system::{StaticCredentials, TokenService};
use cache_system::CacheManager;
use config::{AppConfig, ConfigError, DatabaseConfig, RepositoryBackend};
use store_object::{ItemRepository, MemoryStore, PageLimits, PostgresStore};

/// Main CatalogHaus coordinator that owns the configured components
pub struct CatalogHaus {
    config: AppConfig,
    pool: Option<PgPool>,
    service: CatalogService,
}

impl CatalogHaus {
    /// Create new CatalogHaus with the configured repository backend
    pub async fn new(config: AppConfig) -> Result<Self, CatalogError> {
        config.validate()?;
        let limits = PageLimits::from(&config.repository);

        match config.repository.backend {
            RepositoryBackend::Memory => {
                let repo: Arc<dyn ItemRepository> = Arc::new(MemoryStore::new(limits));
                Self::with_repository(config, repo)
            }
            RepositoryBackend::Postgres => {
                let database = config.database.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("postgres backend requires a [database] section".to_string())
                })?;
                let pool = connect(database).await?;
                let repo: Arc<dyn ItemRepository> =
                    Arc::new(PostgresStore::new(pool.clone(), limits));
                let mut haus = Self::with_repository(config, repo)?;
                haus.pool = Some(pool);
                Ok(haus)
            }
        }
    }

    /// Build around an existing repository; no database pool is attached
    pub fn with_repository(
        config: AppConfig,
        repo: Arc<dyn ItemRepository>,
    ) -> Result<Self, CatalogError> {
        config.validate()?;

        let cache = Arc::new(CacheManager::from_config(&config.cache));
        let resolver = StaticCredentials::from_config(&config.auth.users)?;
        if resolver.is_empty() {
            tracing::warn!("no users configured, token issuance will reject every login");
        }
        let tokens = Arc::new(TokenService::from_config(&config.auth, Arc::new(resolver)));

        tracing::info!(
            backend = ?config.repository.backend,
            cache_enabled = config.cache.enabled,
            cache_ttl_seconds = config.cache.default_ttl_seconds,
            "catalog initialized"
        );

        Ok(Self {
            service: CatalogService::new(repo, cache, tokens),
            pool: None,
            config,
        })
    }

    /// Request orchestrator sharing this coordinator's components
    pub fn service(&self) -> &CatalogService {
        &self.service
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Database pool, when the PostgreSQL backend is in use
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Check that the repository backend answers
    pub async fn health_check(&self) -> Result<(), CatalogError> {
        match &self.pool {
            Some(pool) => {
                sqlx::query("SELECT 1").fetch_one(pool).await?;
            }
            None => {
                self.service.repository().count().await?;
            }
        }
        Ok(())
    }
}

async fn connect(config: &DatabaseConfig) -> Result<PgPool, CatalogError> {
    let connection_string = config.connection_string();

    let mut pool_options = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

    // Set max lifetime if specified
    if config.max_lifetime_seconds > 0 {
        pool_options = pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
    }

    let pool = pool_options.connect(&connection_string).await?;
    tracing::info!(host = %config.host, database = %config.database, "connected to postgres");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::UserConfig;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.signing_secret = "core-test-secret".to_string();
        config.auth.users.push(UserConfig {
            username: "alice".to_string(),
            password: "pw".to_string(),
            role: "editor".to_string(),
        });
        config
    }

    #[tokio::test]
    async fn memory_backend_is_healthy() {
        let haus = CatalogHaus::new(config()).await.unwrap();
        assert!(haus.pool().is_none());
        haus.health_check().await.unwrap();
        assert_eq!(haus.service().repository().page_limits().max_page_size, 100);
    }

    #[tokio::test]
    async fn postgres_backend_without_database_is_rejected() {
        let mut config = config();
        config.repository.backend = RepositoryBackend::Postgres;
        let err = CatalogHaus::new(config).await.err().expect("invalid config");
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut config = config();
        config.auth.users[0].role = "owner".to_string();
        let repo: Arc<dyn ItemRepository> = Arc::new(MemoryStore::default());
        let err = CatalogHaus::with_repository(config, repo).err().expect("bad role");
        assert_eq!(err.kind(), "credential_store");
    }
}
