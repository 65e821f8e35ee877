//! Catalog walkthrough against the in-memory backend
//!
//! Creates an item, reads it twice (the second read is a cache hit), changes
//! its price, reads it again from the repository, deletes it and shows the
//! final 404.
//!
//! Run with: `cargo run --example catalog_demo`

use cataloghaus::prelude::*;
use config::UserConfig;
use serde_json::json;

fn show(label: &str, response: &Response) {
    println!(
        "{:<28} status={} cache={:?} body={}",
        label, response.status, response.cache, response.body
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = AppConfig::default();
    config.logging.level = "info".to_string();
    config.auth.signing_secret = "demo-secret-change-me".to_string();
    config.auth.users.push(UserConfig {
        username: "alice".to_string(),
        password: "wonderland".to_string(),
        role: "editor".to_string(),
    });
    init_logging(&config.logging);

    let haus = CatalogHaus::new(config).await?;
    haus.auto_migrate(false).await?;
    let service = haus.service();

    let token = service
        .issue_token(&Credentials::new("alice", "wonderland"))
        .await?;
    println!("issued token for scopes {:?}", token.scopes);
    let bearer = token.access_token;

    let created = service
        .dispatch(
            &RequestDescriptor::post(
                "/items",
                json!({ "sku": "A1", "name": "Anvil", "category": "tools", "price": 10.0 }),
            )
            .with_bearer(&bearer),
        )
        .await;
    show("POST /items", &created);

    let get = RequestDescriptor::get("/items/sku/A1").with_bearer(&bearer);
    show("GET /items/sku/A1", &service.dispatch(&get).await);
    show("GET /items/sku/A1 (again)", &service.dispatch(&get).await);

    let patched = service
        .dispatch(&RequestDescriptor::patch("/items/A1", json!({ "price": 12.0 })).with_bearer(&bearer))
        .await;
    show("PATCH /items/A1", &patched);
    show("GET /items/sku/A1", &service.dispatch(&get).await);

    let deleted = service
        .dispatch(&RequestDescriptor::delete("/items/A1").with_bearer(&bearer))
        .await;
    show("DELETE /items/A1", &deleted);
    show("GET /items/sku/A1", &service.dispatch(&get).await);

    println!("cache stats: {:?}", service.cache().stats());
    Ok(())
}
