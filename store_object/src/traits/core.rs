//! Trait definitions
//!
//! This module defines the repository contract shared by every backend.

use crate::errors::RepositoryError;
use crate::model::{Item, ItemId, ItemPatch, NewItem};
use crate::pagination::{Page, PageLimits, Pagination};
use async_trait::async_trait;
use std::fmt::Debug;

/// Owner and single source of truth for catalog items
///
/// Every operation is atomic with respect to the others: a reader sees an
/// item either fully before or fully after a mutation. Mutations on the same
/// SKU are serialized; mutations on different SKUs are not ordered.
#[async_trait]
pub trait ItemRepository: Send + Sync + Debug {
    /// Store a new item; fails if the SKU is already present
    async fn create(&self, item: NewItem) -> Result<Item, RepositoryError>;

    /// Get an item by its repository-assigned id
    async fn get_by_id(&self, id: ItemId) -> Result<Item, RepositoryError>;

    /// Get an item by SKU
    async fn get_by_sku(&self, sku: &str) -> Result<Item, RepositoryError>;

    /// List items in ascending id order
    async fn list(&self, pagination: &Pagination) -> Result<Page<Item>, RepositoryError>;

    /// Apply every present field of `patch` atomically
    ///
    /// A patch that changes nothing succeeds without touching `updated_at`.
    async fn apply_patch(&self, sku: &str, patch: ItemPatch) -> Result<Item, RepositoryError>;

    /// Set the price of an item; reapplying the current price is a no-op
    async fn update_price(&self, sku: &str, price: f64) -> Result<Item, RepositoryError> {
        self.apply_patch(sku, ItemPatch::price(price)).await
    }

    /// Remove an item and return it; a missing SKU is `NotFound`
    async fn delete(&self, sku: &str) -> Result<Item, RepositoryError>;

    /// Count all items
    async fn count(&self) -> Result<u64, RepositoryError>;

    /// Page size bounds applied by `list`
    fn page_limits(&self) -> PageLimits;
}
