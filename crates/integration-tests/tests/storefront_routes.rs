//! Integration tests for the storefront JSON routes.
//!
//! The router is served on an ephemeral port and driven with `reqwest`; the
//! cart controller behind it talks to the mock commerce API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use cartsync_integration_tests::{MockCommerce, serve_storefront};
use cartsync_storefront::config::{StorefrontConfig, SyncConfig};
use cartsync_storefront::preferences::{JsonFileStore, ThemePreference};
use cartsync_storefront::state::AppState;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tempfile::TempDir;

struct TestContext {
    client: reqwest::Client,
    base: String,
    mock: MockCommerce,
    prefs_dir: TempDir,
}

impl TestContext {
    async fn new() -> Self {
        let mock = MockCommerce::start().await;
        let prefs_dir = tempfile::tempdir().unwrap();
        let preferences_path = prefs_dir.path().join("preferences.json");

        let config = StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            commerce: mock.commerce_config(),
            sync: SyncConfig::default(),
            preferences_path: preferences_path.clone(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let theme = ThemePreference::load(Arc::new(JsonFileStore::new(preferences_path)))
            .await
            .unwrap();
        let state = AppState::new(config, mock.controller(), theme);
        let base = serve_storefront(state).await;

        Self {
            client: reqwest::Client::new(),
            base,
            mock,
            prefs_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn test_health_and_readiness() {
    let ctx = TestContext::new().await;

    let health = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");

    let (status, _) = ctx.get("/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    ctx.send(reqwest::Method::POST, "/cart/refresh", None).await;
    let (status, _) = ctx.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_view() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"].as_array().unwrap().len(), 2);
    assert_eq!(body["products"][1]["price"], "$25.00");
    assert_eq!(body["cart_item_count"], 0);
    assert_eq!(body["theme"]["mode"], "light");
}

#[tokio::test]
async fn test_cart_mutations_through_routes() {
    let ctx = TestContext::new().await;

    let (status, added) = ctx
        .send(
            reqwest::Method::POST,
            "/cart/items",
            Some(json!({ "product_id": "prod_mug", "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(added["item_count"], 2);
    assert_eq!(added["subtotal"], "$24.00");

    let (_, page) = ctx.get("/cart").await;
    assert_eq!(page["cart"], added);
    let revision = page["revision"].as_u64().unwrap();
    assert!(revision > 0);

    let (_, catalog) = ctx.get("/").await;
    assert_eq!(catalog["cart_item_count"], 2);

    let line = added["items"][0]["id"].as_str().unwrap().to_string();
    let (status, updated) = ctx
        .send(
            reqwest::Method::PUT,
            &format!("/cart/items/{line}"),
            Some(json!({ "quantity": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["items"][0]["quantity"], 5);
    let (_, page) = ctx.get("/cart").await;
    assert!(page["revision"].as_u64().unwrap() > revision);

    let (status, removed) = ctx
        .send(
            reqwest::Method::PUT,
            &format!("/cart/items/{line}"),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["item_count"], 0);

    ctx.send(
        reqwest::Method::POST,
        "/cart/items",
        Some(json!({ "product_id": "prod_tee" })),
    )
    .await;
    let (status, emptied) = ctx.send(reqwest::Method::DELETE, "/cart/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(emptied["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_quantity_is_bad_request_without_store_call() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(
            reqwest::Method::POST,
            "/cart/items",
            Some(json!({ "product_id": "prod_mug", "quantity": 0 })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "bad_request");
    assert_eq!(ctx.mock.mutation_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .post(ctx.url("/cart/items"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(r#"{"product_id": "#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "bad_request");

    let (status, body) = ctx
        .send(
            reqwest::Method::PUT,
            "/cart/items/item_1",
            Some(json!({ "qty": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "bad_request");
    assert_eq!(ctx.mock.mutation_count(), 0);
}

#[tokio::test]
async fn test_store_rejection_is_unprocessable() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(
            reqwest::Method::POST,
            "/cart/items",
            Some(json!({ "product_id": "prod_nope", "quantity": 1 })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["type"], "validation");
    assert_eq!(body["error"]["message"], "Product prod_nope does not exist");
}

#[tokio::test]
async fn test_checkout_views() {
    let ctx = TestContext::new().await;
    ctx.mock.expire_token("chkt_expired");
    ctx.send(
        reqwest::Method::POST,
        "/cart/items",
        Some(json!({ "product_id": "prod_tee", "quantity": 1 })),
    )
    .await;
    let capture = json!({
        "customer": { "firstname": "Ada", "lastname": "Lovelace", "email": "ada@example.com" },
        "payment": { "gateway": "test_gateway" },
    });

    let (status, refused) = ctx
        .send(
            reqwest::Method::POST,
            "/checkout/chkt_expired",
            Some(capture.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refused["checkout_error"], "Checkout token has expired");
    assert!(refused["order"].is_null());
    assert_eq!(refused["cart"]["item_count"], 1);

    let (status, captured) = ctx
        .send(reqwest::Method::POST, "/checkout/chkt_ok", Some(capture))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(captured["checkout_error"].is_null());
    assert_eq!(captured["order"]["id"], "ord_1");
    assert_eq!(captured["order"]["email"], "ada@example.com");
    assert_eq!(captured["cart"]["item_count"], 0);

    let (_, page) = ctx.get("/checkout").await;
    assert_eq!(page["order"]["reference"], "ORD-00001");
    assert_eq!(ctx.mock.captured_orders()[0]["payment"]["gateway"], "test_gateway");
}

#[tokio::test]
async fn test_checkout_captures_add_still_in_flight() {
    let ctx = TestContext::new().await;
    ctx.send(
        reqwest::Method::POST,
        "/cart/items",
        Some(json!({ "product_id": "prod_mug" })),
    )
    .await;
    let capture = json!({
        "customer": { "firstname": "Ada", "lastname": "Lovelace", "email": "ada@example.com" },
    });

    ctx.mock.script_delays(&[150]);
    let ((added_status, _), (status, page)) = tokio::join!(
        ctx.send(
            reqwest::Method::POST,
            "/cart/items",
            Some(json!({ "product_id": "prod_tee" })),
        ),
        async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            ctx.send(reqwest::Method::POST, "/checkout/chkt_ok", Some(capture))
                .await
        },
    );

    assert_eq!(added_status, StatusCode::OK);
    assert_eq!(status, StatusCode::OK);
    assert!(page["checkout_error"].is_null());
    let sent = ctx.mock.captured_orders()[0]["line_items"]
        .as_object()
        .unwrap()
        .len();
    assert_eq!(sent, 2);
}

#[tokio::test]
async fn test_theme_toggle_persists() {
    let ctx = TestContext::new().await;

    let (_, theme) = ctx.get("/preferences/theme").await;
    assert_eq!(theme["dark"], false);

    let (status, toggled) = ctx
        .send(reqwest::Method::POST, "/preferences/theme/toggle", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["mode"], "dark");

    let on_disk: Value = serde_json::from_str(
        &std::fs::read_to_string(ctx.prefs_dir.path().join("preferences.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(on_disk["dark"], true);

    let (_, catalog) = ctx.get("/").await;
    assert_eq!(catalog["theme"]["dark"], true);
}
