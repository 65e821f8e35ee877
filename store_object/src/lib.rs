//! Store Object - item repository layer for CatalogHaus
//!
//! This crate provides the catalog item model, the repository contract,
//! the keyed lock arena that serializes same-SKU mutations, and the
//! in-memory and PostgreSQL repository backends.

pub mod errors;
pub mod locks;
pub mod model;
pub mod pagination;
pub mod prelude;
pub mod stores;
pub mod traits;
pub mod validation;

pub use errors::RepositoryError;
pub use locks::{KeyedLockGuard, KeyedLocks};
pub use model::{Item, ItemId, ItemPatch, NewItem};
pub use pagination::{Page, PageLimits, Pagination};
pub use stores::{MemoryStore, PostgresStore};
pub use traits::*;

use sqlx::PgPool;

pub type DbPool = PgPool;
