//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cataloghaus::prelude::*;
use config::UserConfig;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub const SECRET: &str = "integration-test-secret";

/// Repository wrapper that counts every call reaching the backend
#[derive(Debug)]
pub struct CountingRepository {
    inner: MemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingRepository {
    pub fn new(limits: PageLimits) -> Self {
        Self {
            inner: MemoryStore::new(limits),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.reads() + self.writes()
    }

    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemRepository for CountingRepository {
    async fn create(&self, item: NewItem) -> Result<Item, RepositoryError> {
        self.write();
        self.inner.create(item).await
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Item, RepositoryError> {
        self.read();
        self.inner.get_by_id(id).await
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Item, RepositoryError> {
        self.read();
        self.inner.get_by_sku(sku).await
    }

    async fn list(&self, pagination: &Pagination) -> Result<Page<Item>, RepositoryError> {
        self.read();
        self.inner.list(pagination).await
    }

    async fn apply_patch(&self, sku: &str, patch: ItemPatch) -> Result<Item, RepositoryError> {
        self.write();
        self.inner.apply_patch(sku, patch).await
    }

    async fn delete(&self, sku: &str) -> Result<Item, RepositoryError> {
        self.write();
        self.inner.delete(sku).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        self.read();
        self.inner.count().await
    }

    fn page_limits(&self) -> PageLimits {
        self.inner.page_limits()
    }
}

/// Repository whose patches commit and then wait for `release`
///
/// `committed` is signalled once the patch is stored, so a caller can drop
/// the request while it is parked after the commit.
#[derive(Debug, Default)]
pub struct ParkingRepository {
    inner: MemoryStore,
    pub committed: Notify,
    pub release: Notify,
}

#[async_trait]
impl ItemRepository for ParkingRepository {
    async fn create(&self, item: NewItem) -> Result<Item, RepositoryError> {
        self.inner.create(item).await
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Item, RepositoryError> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Item, RepositoryError> {
        self.inner.get_by_sku(sku).await
    }

    async fn list(&self, pagination: &Pagination) -> Result<Page<Item>, RepositoryError> {
        self.inner.list(pagination).await
    }

    async fn apply_patch(&self, sku: &str, patch: ItemPatch) -> Result<Item, RepositoryError> {
        let item = self.inner.apply_patch(sku, patch).await?;
        self.committed.notify_one();
        self.release.notified().await;
        Ok(item)
    }

    async fn delete(&self, sku: &str) -> Result<Item, RepositoryError> {
        self.inner.delete(sku).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        self.inner.count().await
    }

    fn page_limits(&self) -> PageLimits {
        self.inner.page_limits()
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.signing_secret = SECRET.to_string();
    config.auth.users = vec![
        UserConfig {
            username: "alice".to_string(),
            password: "wonderland".to_string(),
            role: "editor".to_string(),
        },
        UserConfig {
            username: "victor".to_string(),
            password: "viewer-pw".to_string(),
            role: "viewer".to_string(),
        },
    ];
    config
}

pub struct Harness {
    pub haus: CatalogHaus,
    pub repo: Arc<CountingRepository>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let repo = Arc::new(CountingRepository::new(PageLimits::from(&config.repository)));
        let haus = CatalogHaus::with_repository(config, repo.clone()).expect("harness");
        Self { haus, repo }
    }

    pub fn service(&self) -> &CatalogService {
        self.haus.service()
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        self.service()
            .issue_token(&Credentials::new(username, password))
            .await
            .expect("login")
            .access_token
    }

    pub async fn editor_token(&self) -> String {
        self.login("alice", "wonderland").await
    }

    pub async fn viewer_token(&self) -> String {
        self.login("victor", "viewer-pw").await
    }

    pub async fn create(&self, token: &str, sku: &str, price: f64) -> Response {
        self.service()
            .dispatch(
                &RequestDescriptor::post("/items", item_body(sku, price)).with_bearer(token),
            )
            .await
    }
}

pub fn item_body(sku: &str, price: f64) -> Value {
    json!({
        "sku": sku,
        "name": format!("Item {}", sku),
        "category": "tools",
        "price": price,
    })
}
