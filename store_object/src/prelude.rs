//! Convenience re-exports for common store-object usage

// Core traits
pub use crate::traits::ItemRepository;

// Error types
pub use crate::errors::RepositoryError;

// Model and listing types
pub use crate::model::{Item, ItemId, ItemPatch, NewItem};
pub use crate::pagination::{Page, PageLimits, Pagination};

// Repository backends
pub use crate::stores::{MemoryStore, PostgresStore};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use sqlx::PgPool;
