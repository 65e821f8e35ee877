//! In-memory item repository
//!
//! Items live in a `BTreeMap` keyed by id (which gives listing order for
//! free) plus a SKU index, both behind one `tokio::sync::RwLock`. The map
//! lock is only held for the synchronous part of an operation. Mutations
//! additionally hold the per-SKU lock from [`KeyedLocks`] for their whole
//! check-then-act sequence.
//!
//! Not durable: all state is lost when the store is dropped.

use crate::errors::RepositoryError;
use crate::locks::KeyedLocks;
use crate::model::{Item, ItemId, ItemPatch, NewItem};
use crate::pagination::{Page, PageLimits, Pagination};
use crate::traits::ItemRepository;
use crate::validation::{validate_price, validate_sku};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug)]
struct MemoryState {
    items: BTreeMap<ItemId, Item>,
    by_sku: HashMap<String, ItemId>,
    /// Only ever increases, so ids are not reused after a delete
    next_id: ItemId,
}

#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    locks: KeyedLocks,
    limits: PageLimits,
}

impl MemoryStore {
    pub fn new(limits: PageLimits) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                items: BTreeMap::new(),
                by_sku: HashMap::new(),
                next_id: 1,
            }),
            locks: KeyedLocks::new(),
            limits,
        }
    }

    /// Keys with an in-flight mutation
    pub fn active_locks(&self) -> usize {
        self.locks.active_keys()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(PageLimits::default())
    }
}

#[async_trait]
impl ItemRepository for MemoryStore {
    async fn create(&self, item: NewItem) -> Result<Item, RepositoryError> {
        validate_sku(&item.sku)?;
        validate_price(item.price)?;

        let _guard = self.locks.lock(&item.sku).await;
        let mut state = self.state.write().await;

        if state.by_sku.contains_key(&item.sku) {
            return Err(RepositoryError::DuplicateSku(item.sku));
        }

        let id = state.next_id;
        state.next_id += 1;
        let now = Utc::now();
        let created = Item {
            id,
            sku: item.sku,
            name: item.name,
            category: item.category,
            price: item.price,
            created_at: now,
            updated_at: now,
        };
        state.by_sku.insert(created.sku.clone(), id);
        state.items.insert(id, created.clone());

        tracing::debug!(id, sku = %created.sku, "created item");
        Ok(created)
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Item, RepositoryError> {
        let state = self.state.read().await;
        state
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::item_not_found(id))
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Item, RepositoryError> {
        let state = self.state.read().await;
        state
            .by_sku
            .get(sku)
            .and_then(|id| state.items.get(id))
            .cloned()
            .ok_or_else(|| RepositoryError::sku_not_found(sku))
    }

    async fn list(&self, pagination: &Pagination) -> Result<Page<Item>, RepositoryError> {
        let limit = self.limits.resolve(pagination.limit);
        let state = self.state.read().await;

        let matches = |item: &&Item| {
            pagination
                .category
                .as_deref()
                .is_none_or(|category| item.category == category)
        };

        let total_count = state.items.values().filter(matches).count() as u64;
        let items = state
            .items
            .values()
            .filter(matches)
            .skip(usize::try_from(pagination.offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(Page {
            items,
            total_count,
            offset: pagination.offset,
            limit,
        })
    }

    async fn apply_patch(&self, sku: &str, patch: ItemPatch) -> Result<Item, RepositoryError> {
        if let Some(price) = patch.price {
            validate_price(price)?;
        }

        let _guard = self.locks.lock(sku).await;
        let mut state = self.state.write().await;

        let id = *state
            .by_sku
            .get(sku)
            .ok_or_else(|| RepositoryError::sku_not_found(sku))?;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::item_not_found(id))?;

        if patch.apply_to(item, Utc::now()) {
            tracing::debug!(id, sku, "patched item");
        }
        Ok(item.clone())
    }

    async fn delete(&self, sku: &str) -> Result<Item, RepositoryError> {
        let _guard = self.locks.lock(sku).await;
        let mut state = self.state.write().await;

        let id = state
            .by_sku
            .remove(sku)
            .ok_or_else(|| RepositoryError::sku_not_found(sku))?;
        let removed = state
            .items
            .remove(&id)
            .ok_or_else(|| RepositoryError::item_not_found(id))?;

        tracing::debug!(id, sku, "deleted item");
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.state.read().await.items.len() as u64)
    }

    fn page_limits(&self) -> PageLimits {
        self.limits
    }
}
