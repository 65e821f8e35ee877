//! # CatalogHaus
//!
//! An async catalog service core: signed access tokens, scope-based
//! authorization, a pluggable item repository and a request-keyed response
//! cache, composed per request by [`CatalogService`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cataloghaus::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     init_logging(&config.logging);
//!
//!     let haus = CatalogHaus::new(config).await?;
//!     haus.auto_migrate(false).await?;
//!     let service = haus.service();
//!
//!     let token = service
//!         .issue_token(&Credentials::new("alice", "wonderland"))
//!         .await?;
//!
//!     let created = service
//!         .dispatch(
//!             &RequestDescriptor::post(
//!                 "/items",
//!                 json!({ "sku": "A1", "name": "Anvil", "category": "tools", "price": 10.0 }),
//!             )
//!             .with_bearer(&token.access_token),
//!         )
//!         .await;
//!     println!("{} {}", created.status, created.body);
//!
//!     let fetched = service
//!         .dispatch(&RequestDescriptor::get("/items/sku/A1").with_bearer(&token.access_token))
//!         .await;
//!     println!("{:?} {}", fetched.cache, fetched.body);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod logging;
pub mod migration;
pub mod prelude;
pub mod routes;
pub mod service;

// Re-export the main public types for convenience
pub use core::CatalogHaus;
pub use errors::CatalogError;
pub use logging::init_logging;
pub use routes::{Method, Route, required_scope_for};
pub use service::{CacheStatus, CatalogService, RequestDescriptor, Response};

// Re-export centralized config
pub use config::{AppConfig, AuthConfig, CacheConfig, DatabaseConfig, LoggingConfig, RepositoryConfig};

// Re-export internal crates used by the public API
pub use auth_system;
pub use cache_system;
pub use store_object;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
