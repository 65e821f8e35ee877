//! Convenience re-exports for common CatalogHaus usage
//!
//! This prelude module re-exports the most commonly used items from the CatalogHaus workspace,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use cataloghaus::prelude::*;
//!
//! // Now you have access to all the common CatalogHaus types and traits
//! ```

// Core CatalogHaus components
pub use crate::core::CatalogHaus;
pub use crate::errors::CatalogError;
pub use crate::logging::init_logging;
pub use crate::routes::{Method, Route, required_scope_for};
pub use crate::service::{CacheStatus, CatalogService, RequestDescriptor, Response};

// Re-export centralized config
pub use config::{AppConfig, AuthConfig, CacheConfig, DatabaseConfig, LoggingConfig, RepositoryConfig};

// Repository layer
pub use store_object::prelude::*;

// Token service and guard
pub use auth_system::prelude::*;

// Response cache
pub use cache_system::prelude::*;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use sqlx;
pub use tokio;
