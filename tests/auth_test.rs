mod common;

use cataloghaus::prelude::*;
use common::{Harness, SECRET, item_body};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_insufficient_scope_touches_nothing() {
    let harness = Harness::new();
    let viewer = harness.viewer_token().await;
    let cached_before = harness.service().cache().stats();

    let response = harness.create(&viewer, "A1", 10.0).await;
    assert_eq!(response.status, 403);
    assert_eq!(response.error_kind(), Some("insufficient_scope"));
    assert_eq!(response.cache, CacheStatus::Bypass);

    assert_eq!(harness.repo.calls(), 0);
    assert_eq!(harness.service().cache().stats(), cached_before);
    assert!(harness.service().cache().is_empty());
}

#[tokio::test]
async fn test_viewer_can_read() {
    let harness = Harness::new();
    let viewer = harness.viewer_token().await;
    let response = harness
        .service()
        .dispatch(&RequestDescriptor::get("/items").with_bearer(&viewer))
        .await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_explicit_scope_overrides_method_default() {
    let harness = Harness::new();
    let viewer = harness.viewer_token().await;
    let response = harness
        .service()
        .handle(
            &RequestDescriptor::get("/items").with_bearer(&viewer),
            ITEMS_WRITE,
        )
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(harness.repo.calls(), 0);
}

#[tokio::test]
async fn test_bad_credentials_rejected() {
    let harness = Harness::new();
    let err = harness
        .service()
        .issue_token(&Credentials::new("alice", "nope"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 401);
    assert_eq!(err.kind(), "invalid_credentials");
}

#[tokio::test]
async fn test_expired_token_with_bad_signature_reports_expired() {
    let harness = Harness::new();
    let now = chrono::Utc::now().timestamp();
    let forger = TokenService::new(
        "cataloghaus",
        "catalog-api",
        Duration::from_secs(60),
        0,
        b"not-the-real-secret",
        Arc::new(StaticCredentials::new()),
    );
    let token = forger
        .sign(&Claims {
            iss: "cataloghaus".to_string(),
            aud: "catalog-api".to_string(),
            sub: "mallory".to_string(),
            exp: now - 30,
            iat: now - 90,
            jti: None,
            scopes: vec![ITEMS_READ.to_string(), ITEMS_WRITE.to_string()],
        })
        .unwrap();

    let response = harness
        .service()
        .dispatch(&RequestDescriptor::get("/items").with_bearer(&token))
        .await;
    assert_eq!(response.status, 401);
    assert_eq!(response.error_kind(), Some("expired"));
    assert_eq!(harness.repo.calls(), 0);
}

#[tokio::test]
async fn test_foreign_signature_rejected() {
    let harness = Harness::new();
    let forger = TokenService::new(
        "cataloghaus",
        "catalog-api",
        Duration::from_secs(60),
        0,
        b"not-the-real-secret",
        Arc::new(StaticCredentials::new()),
    );
    let token = forger
        .mint("mallory", vec![ITEMS_WRITE.to_string()])
        .unwrap()
        .access_token;

    let response = harness.create(&token, "EVIL", 0.0).await;
    assert_eq!(response.status, 401);
    assert_eq!(response.error_kind(), Some("signature_invalid"));
    assert_eq!(harness.repo.calls(), 0);
}

#[tokio::test]
async fn test_token_from_same_secret_is_accepted() {
    let harness = Harness::new();
    let twin = TokenService::new(
        "cataloghaus",
        "catalog-api",
        Duration::from_secs(60),
        0,
        SECRET.as_bytes(),
        Arc::new(StaticCredentials::new()),
    );
    let token = twin
        .mint("service-account", vec![ITEMS_READ.to_string(), ITEMS_WRITE.to_string()])
        .unwrap()
        .access_token;

    let response = harness
        .service()
        .dispatch(&RequestDescriptor::post("/items", item_body("SVC", 1.0)).with_bearer(&token))
        .await;
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_missing_and_garbage_tokens() {
    let harness = Harness::new();
    let service = harness.service();

    let response = service.dispatch(&RequestDescriptor::get("/items")).await;
    assert_eq!(response.error_kind(), Some("missing_token"));

    let response = service
        .dispatch(&RequestDescriptor::get("/items").with_bearer("garbage"))
        .await;
    assert_eq!(response.status, 401);
    assert_eq!(response.error_kind(), Some("malformed"));
    assert_eq!(harness.repo.calls(), 0);
}
