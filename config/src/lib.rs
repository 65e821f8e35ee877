//! # Configuration Management for CatalogHaus
//!
//! This crate provides centralized configuration structures for all CatalogHaus components:
//! repository backend, database pool, response cache, token service and logging.
//!
//! ## TOML File Configuration
//! ```toml
//! [repository]
//! backend = "memory"
//! default_page_size = 20
//! max_page_size = 100
//!
//! [cache]
//! enabled = true
//! default_ttl_seconds = 60
//! key_prefix = "catalog"
//!
//! [auth]
//! issuer = "cataloghaus"
//! audience = "catalog-api"
//! signing_secret = "change-me"
//! token_ttl_seconds = 900
//! leeway_seconds = 0
//!
//! [[auth.users]]
//! username = "alice"
//! password = "wonderland"
//! role = "editor"
//!
//! [logging]
//! level = "info"
//! ansi = true
//! ```
//!
//! A `[database]` section is required when `repository.backend = "postgres"`.
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from $CATALOGHAUS_CONFIG or ./cataloghaus.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./cataloghaus.toml";
const CONFIG_PATH_ENV: &str = "CATALOGHAUS_CONFIG";
const SIGNING_SECRET_ENV: &str = "CATALOGHAUS_SIGNING_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which storage engine backs the item repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryBackend {
    #[default]
    Memory,
    Postgres,
}

/// Repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub backend: RepositoryBackend,
    /// Page size used when a listing does not ask for one
    pub default_page_size: u32,
    /// Upper bound for a listing page; larger requests are clamped
    pub max_page_size: u32,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub default_ttl_seconds: u64,
    pub key_prefix: String,
}

/// Token service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    /// HMAC secret; empty means an ephemeral secret is generated at startup
    #[serde(default)]
    pub signing_secret: String,
    pub token_ttl_seconds: u64,
    #[serde(default)]
    pub leeway_seconds: u64,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// Static credential entry resolved by the development credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

fn default_ansi() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from the TOML file named in .env / environment or defaults
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine; a malformed one is not
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err.into()),
        }

        let mut config = if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            Self::parse_file(&config_path)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::parse_file(DEFAULT_CONFIG_PATH)?
        } else {
            return Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH
            )));
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        match env::var(SIGNING_SECRET_ENV) {
            Ok(secret) => self.auth.signing_secret = secret,
            Err(env::VarError::NotPresent) => {}
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Repository validations
        if self.repository.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "Repository default_page_size must be greater than 0".to_string(),
            ));
        }
        if self.repository.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "Repository max_page_size must be greater than 0".to_string(),
            ));
        }
        if self.repository.default_page_size > self.repository.max_page_size {
            return Err(ConfigError::Invalid(
                "Repository default_page_size cannot be greater than max_page_size".to_string(),
            ));
        }

        // Database validations
        match (&self.repository.backend, &self.database) {
            (RepositoryBackend::Postgres, None) => {
                return Err(ConfigError::Invalid(
                    "A [database] section is required for the postgres backend".to_string(),
                ));
            }
            (_, Some(database)) => database.validate()?,
            _ => {}
        }

        // Cache validations
        if self.cache.default_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Cache default_ttl_seconds must be greater than 0".to_string(),
            ));
        }
        if self.cache.key_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "Cache key_prefix cannot be empty".to_string(),
            ));
        }

        // Auth validations
        if self.auth.issuer.is_empty() {
            return Err(ConfigError::Invalid(
                "Auth issuer cannot be empty".to_string(),
            ));
        }
        if self.auth.audience.is_empty() {
            return Err(ConfigError::Invalid(
                "Auth audience cannot be empty".to_string(),
            ));
        }
        if self.auth.token_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Auth token_ttl_seconds must be greater than 0".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for user in &self.auth.users {
            if user.username.is_empty() {
                return Err(ConfigError::Invalid(
                    "Auth user username cannot be empty".to_string(),
                ));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Auth user '{}' is declared more than once",
                    user.username
                )));
            }
        }

        if self.logging.level.is_empty() {
            return Err(ConfigError::Invalid(
                "Logging level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            backend: RepositoryBackend::Memory,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl RepositoryConfig {
    /// Create a new repository configuration
    pub fn new(backend: RepositoryBackend, default_page_size: u32, max_page_size: u32) -> Self {
        Self {
            backend,
            default_page_size,
            max_page_size,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_seconds: 60,
            key_prefix: "catalog".to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new(enabled: bool, default_ttl_seconds: u64, key_prefix: String) -> Self {
        Self {
            enabled,
            default_ttl_seconds,
            key_prefix,
        }
    }

    /// Get TTL as Duration
    pub fn ttl_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.default_ttl_seconds)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "cataloghaus".to_string(),
            audience: "catalog-api".to_string(),
            signing_secret: String::new(),
            token_ttl_seconds: 900,
            leeway_seconds: 0,
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Create a new auth configuration without any static users
    pub fn new(
        issuer: String,
        audience: String,
        signing_secret: String,
        token_ttl_seconds: u64,
        leeway_seconds: u64,
    ) -> Self {
        Self {
            issuer,
            audience,
            signing_secret,
            token_ttl_seconds,
            leeway_seconds,
            users: Vec::new(),
        }
    }

    pub fn with_user(mut self, username: &str, password: &str, role: &str) -> Self {
        self.users.push(UserConfig {
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        });
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        min_connections: u32,
        max_connections: u32,
        connection_timeout_seconds: u64,
        idle_timeout_seconds: u64,
        max_lifetime_seconds: u64,
    ) -> Self {
        Self {
            host,
            port,
            database,
            username,
            password,
            min_connections,
            max_connections,
            connection_timeout_seconds,
            idle_timeout_seconds,
            max_lifetime_seconds,
        }
    }

    /// Build connection string
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid(
                "Database host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "Database port cannot be zero".to_string(),
            ));
        }
        if self.database.is_empty() {
            return Err(ConfigError::Invalid(
                "Database name cannot be empty".to_string(),
            ));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Invalid(
                "Database username cannot be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".to_string(),
            ));
        }
        if self.connection_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connection_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
