//! Request orchestration
//!
//! [`CatalogService`] composes the token service, the authorization guard,
//! the response cache and the item repository for one request at a time:
//!
//! 1. parse the bearer token and verify it
//! 2. check the required scope
//! 3. reads consult the cache and fall back to the repository
//! 4. writes go to the repository, then invalidate every overlapping cache family
//!
//! A request that fails authentication or authorization never reaches the
//! cache or the repository.

use crate::errors::CatalogError;
use crate::routes::{ITEMS_PATH, Method, Route, item_path, required_scope_for, sku_path};
use crate::{debug_log, trace_log};
use auth_system::{Credentials, IssuedToken, TokenService, authorize, bearer_token};
use cache_system::{CacheKey, CacheManager, KeyPattern};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use store_object::{Item, ItemPatch, ItemRepository, NewItem};

const CONSISTENCY_TARGET: &str = "cataloghaus::consistency";

/// Where a response body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from cache
    Hit,
    /// Read from the repository, possibly stored for later
    Miss,
    /// The cache was not consulted
    Bypass,
}

/// Inbound request as handed over by the router
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: impl Into<Method>, path: &str) -> Self {
        Self {
            method: method.into(),
            path: path.to_string(),
            query: Vec::new(),
            authorization: None,
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn patch(path: &str, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Set the raw `Authorization` header value
    pub fn with_authorization(mut self, header: &str) -> Self {
        self.authorization = Some(header.to_string());
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_authorization(&format!("Bearer {}", token))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
    pub cache: CacheStatus,
}

impl Response {
    fn new(status: u16, body: Value, cache: CacheStatus) -> Self {
        Self {
            status,
            body,
            cache,
        }
    }

    pub fn from_error(error: &CatalogError) -> Self {
        Self::new(error.status(), error.body(), CacheStatus::Bypass)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error kind of a failed response
    pub fn error_kind(&self) -> Option<&str> {
        if self.is_success() {
            return None;
        }
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Per-request coordinator over the catalog components
#[derive(Debug, Clone)]
pub struct CatalogService {
    repo: Arc<dyn ItemRepository>,
    cache: Arc<CacheManager>,
    tokens: Arc<TokenService>,
}

impl CatalogService {
    pub fn new(
        repo: Arc<dyn ItemRepository>,
        cache: Arc<CacheManager>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            repo,
            cache,
            tokens,
        }
    }

    pub fn repository(&self) -> &Arc<dyn ItemRepository> {
        &self.repo
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Exchange credentials for an access token
    pub async fn issue_token(&self, credentials: &Credentials) -> Result<IssuedToken, CatalogError> {
        Ok(self.tokens.issue(credentials).await?)
    }

    /// Handle a request with the scope implied by its method
    pub async fn dispatch(&self, request: &RequestDescriptor) -> Response {
        self.handle(request, required_scope_for(&request.method))
            .await
    }

    /// Handle a request that needs `required_scope`
    pub async fn handle(&self, request: &RequestDescriptor, required_scope: &str) -> Response {
        match self.try_handle(request, required_scope).await {
            Ok(response) => response,
            Err(err) => {
                let response = Response::from_error(&err);
                if response.status >= 500 {
                    tracing::error!(
                        method = %request.method,
                        path = %request.path,
                        error = %err,
                        "request failed"
                    );
                } else {
                    tracing::debug!(
                        method = %request.method,
                        path = %request.path,
                        status = response.status,
                        kind = err.kind(),
                        "request rejected"
                    );
                }
                response
            }
        }
    }

    async fn try_handle(
        &self,
        request: &RequestDescriptor,
        required_scope: &str,
    ) -> Result<Response, CatalogError> {
        let token = bearer_token(request.authorization.as_deref())?;
        let claims = self.tokens.verify(token)?;
        authorize(&claims, required_scope)?;
        trace_log!(subject = %claims.sub, scope = required_scope, "request authorized");

        let route = Route::resolve(&request.method, &request.path, &request.query)?;
        match route {
            Route::ListItems(pagination) => {
                // Key on the effective page so equivalent listings share an entry
                let limit = self.repo.page_limits().resolve(pagination.limit);
                let mut query = vec![
                    ("offset".to_string(), pagination.offset.to_string()),
                    ("limit".to_string(), limit.to_string()),
                ];
                if let Some(category) = &pagination.category {
                    query.push(("category".to_string(), category.clone()));
                }
                let key = self.cache.key(Method::Get.as_str(), ITEMS_PATH, query);
                self.cached_read(key, async {
                    Ok::<_, CatalogError>(serde_json::to_value(self.repo.list(&pagination).await?)?)
                })
                .await
            }
            Route::GetById(id) => {
                let key = self.read_key(&item_path(id));
                self.cached_read(key, async {
                    Ok::<_, CatalogError>(serde_json::to_value(self.repo.get_by_id(id).await?)?)
                })
                .await
            }
            Route::GetBySku(sku) => {
                let key = self.read_key(&sku_path(&sku));
                self.cached_read(key, async {
                    Ok::<_, CatalogError>(serde_json::to_value(self.repo.get_by_sku(&sku).await?)?)
                })
                .await
            }
            Route::CreateItem => {
                let new_item: NewItem = parse_body(request.body.as_ref())?;
                let item = self.mutate(self.repo.create(new_item)).await?;
                tracing::info!(id = item.id, sku = %item.sku, subject = %claims.sub, "item created");
                Ok(Response::new(201, serde_json::to_value(&item)?, CacheStatus::Bypass))
            }
            Route::PatchItem(sku) => {
                let patch: ItemPatch = parse_body(request.body.as_ref())?;
                if patch.is_empty() {
                    return Err(CatalogError::BadRequest(
                        "patch must set at least one field".to_string(),
                    ));
                }
                let item = self.mutate(self.repo.apply_patch(&sku, patch)).await?;
                tracing::info!(id = item.id, sku = %item.sku, subject = %claims.sub, "item updated");
                Ok(Response::new(200, serde_json::to_value(&item)?, CacheStatus::Bypass))
            }
            Route::DeleteItem(sku) => {
                let item = self.mutate(self.repo.delete(&sku)).await?;
                tracing::info!(id = item.id, sku = %item.sku, subject = %claims.sub, "item deleted");
                Ok(Response::new(204, Value::Null, CacheStatus::Bypass))
            }
        }
    }

    fn read_key(&self, path: &str) -> CacheKey {
        self.cache
            .key(Method::Get.as_str(), path, std::iter::empty::<(&str, &str)>())
    }

    /// Serve from cache or load from the repository and remember the result
    async fn cached_read<F>(&self, key: CacheKey, load: F) -> Result<Response, CatalogError>
    where
        F: Future<Output = Result<Value, CatalogError>>,
    {
        if !self.cache.params().enabled {
            return Ok(Response::new(200, load.await?, CacheStatus::Bypass));
        }

        match self.cache.get::<Value>(&key) {
            Ok(Some(body)) => {
                debug_log!(key = %key, "cache hit");
                return Ok(Response::new(200, body, CacheStatus::Hit));
            }
            Ok(None) => {
                debug_log!(key = %key, "cache miss");
            }
            Err(err) => tracing::warn!(key = %key, error = %err, "cache read failed, treating as miss"),
        }

        // Captured before the read so a concurrent invalidation voids our put
        let observed = match self.cache.generation() {
            Ok(generation) => Some(generation),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "cache generation unavailable, not caching");
                None
            }
        };

        let body = load.await?;

        if let Some(observed) = observed {
            let ttl = self.cache.params().ttl;
            if let Err(err) = self.cache.put_if_fresh(&key, &body, ttl, observed) {
                tracing::warn!(key = %key, error = %err, "cache write failed");
            }
        }
        Ok(Response::new(200, body, CacheStatus::Miss))
    }

    /// Run a repository mutation and invalidate what it could have made stale
    ///
    /// Invalidation failures are logged and never fail the request.
    async fn mutate<F>(&self, mutation: F) -> Result<Item, CatalogError>
    where
        F: Future<Output = Result<Item, store_object::RepositoryError>>,
    {
        let guard = AbandonedMutationGuard::arm(&self.cache);
        let outcome = mutation.await;
        guard.disarm();

        let item = outcome?;
        self.invalidate_item(&item);
        Ok(item)
    }

    fn invalidate_item(&self, item: &Item) {
        let get = Method::Get.as_str();
        let patterns = [
            self.cache.family(get, ITEMS_PATH),
            self.cache.family(get, &item_path(item.id)),
            self.cache.family(get, &sku_path(&item.sku)),
        ];
        for pattern in &patterns {
            invalidate_or_warn(&self.cache, pattern);
        }
    }
}

fn invalidate_or_warn(cache: &CacheManager, pattern: &KeyPattern) {
    if let Err(err) = cache.invalidate(pattern) {
        tracing::warn!(
            target: CONSISTENCY_TARGET,
            pattern = %pattern,
            error = %err,
            "cache invalidation failed after a committed mutation; stale reads possible until TTL"
        );
    }
}

fn parse_body<T>(body: Option<&Value>) -> Result<T, CatalogError>
where
    T: for<'de> Deserialize<'de>,
{
    let body = body.ok_or_else(|| CatalogError::BadRequest("missing request body".to_string()))?;
    T::deserialize(body).map_err(|err| CatalogError::BadRequest(format!("invalid body: {}", err)))
}

/// Flushes every cached item read if a mutation is dropped mid-flight
///
/// The repository may already have committed, and nobody is left to
/// invalidate the precise families.
struct AbandonedMutationGuard<'a> {
    cache: &'a CacheManager,
    armed: bool,
}

impl<'a> AbandonedMutationGuard<'a> {
    fn arm(cache: &'a CacheManager) -> Self {
        Self { cache, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonedMutationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(
                target: CONSISTENCY_TARGET,
                "mutation abandoned mid-flight, flushing cached item reads"
            );
            let pattern = self.cache.subtree(Method::Get.as_str(), ITEMS_PATH);
            invalidate_or_warn(self.cache, &pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_system::{ITEMS_READ, ITEMS_WRITE, StaticCredentials};
    use cache_system::CacheParams;
    use serde_json::json;
    use std::time::Duration;
    use store_object::{MemoryStore, PageLimits};

    fn service() -> CatalogService {
        let tokens = TokenService::new(
            "cataloghaus",
            "catalog-api",
            Duration::from_secs(300),
            0,
            b"unit-test-secret",
            Arc::new(StaticCredentials::new()),
        );
        CatalogService::new(
            Arc::new(MemoryStore::new(PageLimits::new(10, 50))),
            Arc::new(CacheManager::new(CacheParams::new(
                Duration::from_secs(60),
                "test",
            ))),
            Arc::new(tokens),
        )
    }

    fn token(service: &CatalogService, scopes: &[&str]) -> String {
        service
            .tokens()
            .mint("tester", scopes.iter().map(|s| s.to_string()).collect())
            .unwrap()
            .access_token
    }

    #[tokio::test]
    async fn missing_and_malformed_headers() {
        let service = service();
        let response = service.dispatch(&RequestDescriptor::get("/items")).await;
        assert_eq!(response.status, 401);
        assert_eq!(response.error_kind(), Some("missing_token"));

        let response = service
            .dispatch(&RequestDescriptor::get("/items").with_authorization("Token abc"))
            .await;
        assert_eq!(response.status, 401);
        assert_eq!(response.error_kind(), Some("malformed"));
    }

    #[tokio::test]
    async fn create_requires_body() {
        let service = service();
        let writer = token(&service, &[ITEMS_READ, ITEMS_WRITE]);
        let response = service
            .dispatch(&RequestDescriptor::new(Method::Post, "/items").with_bearer(&writer))
            .await;
        assert_eq!(response.status, 400);

        let response = service
            .dispatch(
                &RequestDescriptor::post("/items", json!({ "sku": "A1" })).with_bearer(&writer),
            )
            .await;
        assert_eq!(response.status, 400);
        assert_eq!(response.error_kind(), Some("bad_request"));
    }

    #[tokio::test]
    async fn empty_or_unknown_patch_fields_rejected() {
        let service = service();
        let writer = token(&service, &[ITEMS_READ, ITEMS_WRITE]);
        for body in [json!({}), json!({ "sku": "B2" })] {
            let response = service
                .dispatch(&RequestDescriptor::patch("/items/A1", body).with_bearer(&writer))
                .await;
            assert_eq!(response.status, 400);
        }
    }

    #[tokio::test]
    async fn listing_key_uses_effective_limit() {
        let service = service();
        let reader = token(&service, &[ITEMS_READ]);

        let first = service
            .dispatch(
                &RequestDescriptor::get("/items")
                    .with_query("limit", "500")
                    .with_bearer(&reader),
            )
            .await;
        assert_eq!(first.cache, CacheStatus::Miss);
        assert_eq!(first.body["limit"], 50);

        let second = service
            .dispatch(
                &RequestDescriptor::get("/items")
                    .with_query("limit", "50")
                    .with_query("offset", "0")
                    .with_bearer(&reader),
            )
            .await;
        assert_eq!(second.cache, CacheStatus::Hit);
    }

    #[tokio::test]
    async fn abandoned_mutation_flushes_item_reads() {
        let service = service();
        let key = service.read_key(&item_path(1));
        service.cache().put_default(&key, &json!({ "id": 1 })).unwrap();
        assert_eq!(service.cache().len(), 1);

        {
            let _guard = AbandonedMutationGuard::arm(service.cache());
        }
        assert!(service.cache().is_empty());

        service.cache().put_default(&key, &json!({ "id": 1 })).unwrap();
        AbandonedMutationGuard::arm(service.cache()).disarm();
        assert_eq!(service.cache().len(), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let service = service();
        let reader = token(&service, &[ITEMS_READ]);
        let request = RequestDescriptor::get("/items/sku/NOPE").with_bearer(&reader);

        assert_eq!(service.dispatch(&request).await.status, 404);
        assert!(service.cache().is_empty());
        assert_eq!(service.dispatch(&request).await.status, 404);
    }

    #[tokio::test]
    async fn disabled_cache_bypasses() {
        let service = service();
        let disabled = CatalogService::new(
            service.repository().clone(),
            Arc::new(CacheManager::new(
                CacheParams::new(Duration::from_secs(60), "test").disabled(),
            )),
            service.tokens().clone(),
        );
        let reader = token(&disabled, &[ITEMS_READ]);
        let response = disabled
            .dispatch(&RequestDescriptor::get("/items").with_bearer(&reader))
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(response.cache, CacheStatus::Bypass);
    }
}
