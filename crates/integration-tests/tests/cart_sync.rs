//! Integration tests for the cart controller against the mock commerce API.
//!
//! Every test goes through the real `CommerceClient` over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::http::StatusCode;
use cartsync_core::{LineItemId, ProductId};
use cartsync_integration_tests::{MockCommerce, MockOptions};
use cartsync_storefront::commerce::{CartGateway, CommerceClient, ErrorKind};
use cartsync_storefront::sync::{CartController, SyncError};
use secrecy::SecretString;

fn mug() -> ProductId {
    ProductId::new("prod_mug")
}

fn tee() -> ProductId {
    ProductId::new("prod_tee")
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn test_concurrent_operations_apply_in_issuance_order() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    let id = cart.retrieve().await.unwrap().id;

    // Earliest request is the slowest
    mock.script_delays(&[80, 40, 5]);
    let (first, second, third) = tokio::join!(
        cart.add(mug(), 1),
        cart.add(tee(), 2),
        cart.add(mug(), 3),
    );
    let third = third.unwrap();

    let mutations: Vec<String> = mock
        .requests()
        .into_iter()
        .filter(|r| r.starts_with("POST"))
        .collect();
    assert_eq!(
        mutations,
        [
            format!("POST /carts/{id} prod_mug 1"),
            format!("POST /carts/{id} prod_tee 2"),
            format!("POST /carts/{id} prod_mug 3"),
        ]
    );
    assert_eq!(mock.max_in_flight(), 1);
    assert_eq!(first.unwrap().total_items, 1);
    assert_eq!(second.unwrap().total_items, 3);
    assert_eq!(third.total_items, 6);

    let mirrored = cart.snapshot().cart().cloned().unwrap();
    assert_eq!(mirrored, third);
    assert_eq!(
        mock.cart_lines(id.as_str()).unwrap(),
        [("prod_mug".to_string(), 4), ("prod_tee".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_clones_share_one_queue_and_mirror() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    let other = cart.clone();
    cart.retrieve().await.unwrap();

    mock.script_delays(&[30, 1]);
    let (a, b) = tokio::join!(cart.add(mug(), 1), other.add(tee(), 1));
    a.unwrap();
    let last = b.unwrap();

    assert_eq!(mock.max_in_flight(), 1);
    assert_eq!(other.snapshot().cart(), Some(&last));
    assert_eq!(cart.snapshot(), other.snapshot());
}

#[tokio::test]
async fn test_mirror_subscriber_sees_each_confirmed_cart() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    cart.retrieve().await.unwrap();
    let mut mirror = cart.mirror();
    let start = mirror.snapshot().revision();

    let watcher = tokio::spawn(async move { mirror.changed().await });
    let added = cart.add(mug(), 2).await.unwrap();

    let seen = watcher.await.unwrap().unwrap();
    assert_eq!(seen.cart(), Some(&added));
    assert!(seen.revision() > start);
}

// =============================================================================
// Quantities
// =============================================================================

#[tokio::test]
async fn test_non_positive_add_makes_no_request() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();

    let zero = cart.add(mug(), 0).await.unwrap_err();
    let negative = cart.add(mug(), -1).await.unwrap_err();

    assert!(matches!(zero, SyncError::InvalidQuantity(_)));
    assert!(matches!(negative, SyncError::InvalidQuantity(_)));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    let added = cart.add(mug(), 2).await.unwrap();
    let item = added.line_items[0].id.clone();

    let after = cart.update(item.clone(), 0).await.unwrap();

    assert!(after.is_empty());
    assert_eq!(
        mock.requests().last().unwrap(),
        &format!("DELETE /carts/{}/items/{item}", added.id)
    );
}

#[tokio::test]
async fn test_update_sets_quantity() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    let added = cart.add(tee(), 1).await.unwrap();

    let after = cart
        .update(added.line_items[0].id.clone(), 4)
        .await
        .unwrap();

    assert_eq!(after.line_items[0].quantity.get(), 4);
    assert_eq!(after.total_price.display(), "$100.00");
}

// =============================================================================
// Store contract
// =============================================================================

#[tokio::test]
async fn test_repeated_add_merges_when_store_merges() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();

    cart.add(mug(), 2).await.unwrap();
    let after = cart.add(mug(), 3).await.unwrap();

    assert_eq!(after.line_items.len(), 1);
    assert_eq!(after.quantity_of(&mug()), 5);
    assert_eq!(cart.snapshot().cart(), Some(&after));
}

#[tokio::test]
async fn test_repeated_add_appends_when_store_appends() {
    let mock = MockCommerce::start_with(MockOptions {
        merge_adds: false,
        ..MockOptions::default()
    })
    .await;
    let cart = mock.controller();

    cart.add(mug(), 2).await.unwrap();
    let after = cart.add(mug(), 3).await.unwrap();

    assert_eq!(after.line_items.len(), 2);
    assert_eq!(after.quantity_of(&mug()), 5);
    assert_eq!(after.total_unique_items, 2);
    assert_eq!(cart.snapshot().cart(), Some(&after));
}

#[tokio::test]
async fn test_empty_twice_succeeds() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    cart.add(mug(), 1).await.unwrap();

    assert!(cart.empty().await.unwrap().is_empty());
    assert!(cart.empty().await.unwrap().is_empty());
    assert!(cart.snapshot().cart().unwrap().is_empty());
}

#[tokio::test]
async fn test_retrieve_then_refresh_is_identical() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    cart.add(tee(), 2).await.unwrap();

    let retrieved = cart.retrieve().await.unwrap();
    let refreshed = cart.refresh().await.unwrap();

    assert_eq!(retrieved, refreshed);
}

#[tokio::test]
async fn test_resume_loads_existing_cart() {
    let mock = MockCommerce::start().await;
    let first = mock.controller();
    let cart = first.add(mug(), 2).await.unwrap();

    let second = mock.controller();
    let resumed = second.resume(cart.id.clone()).await.unwrap();

    assert_eq!(resumed, cart);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_unknown_product_is_validation_error() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    let before = cart.retrieve().await.unwrap();

    let err = cart.add(ProductId::new("prod_nope"), 1).await.unwrap_err();

    assert_eq!(err.gateway_kind(), Some(ErrorKind::Validation));
    assert_eq!(err.to_string(), "Validation failed: Product prod_nope does not exist");
    assert_eq!(cart.snapshot().cart(), Some(&before));
}

#[tokio::test]
async fn test_server_error_is_transport_and_queue_continues() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    cart.retrieve().await.unwrap();

    mock.fail_next(StatusCode::SERVICE_UNAVAILABLE, "Maintenance");
    let (failed, next) = tokio::join!(cart.add(mug(), 1), cart.add(tee(), 1));

    assert_eq!(failed.unwrap_err().gateway_kind(), Some(ErrorKind::Transport));
    let next = next.unwrap();
    assert_eq!(next.quantity_of(&tee()), 1);
    assert_eq!(next.quantity_of(&mug()), 0);
    assert_eq!(cart.snapshot().cart(), Some(&next));
}

#[tokio::test]
async fn test_missing_line_item_is_reported_to_caller() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    cart.add(mug(), 1).await.unwrap();

    let err = cart
        .update(LineItemId::new("item_missing"), 2)
        .await
        .unwrap_err();

    assert_eq!(err.gateway_kind(), Some(ErrorKind::Validation));
    assert_eq!(cart.snapshot().total_items(), 1);
}

#[tokio::test]
async fn test_wrong_key_is_authorization_error() {
    let mock = MockCommerce::start().await;
    let mut config = mock.commerce_config();
    config.public_key = SecretString::from("pk_test_wrong");
    let gateway: Arc<dyn CartGateway> =
        Arc::new(CommerceClient::new(&config, std::time::Duration::from_secs(60)));
    let cart = CartController::spawn(gateway, 4);

    let err = cart.retrieve().await.unwrap_err();

    assert_eq!(err.gateway_kind(), Some(ErrorKind::Authorization));
    assert!(cart.snapshot().cart().is_none());
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_is_listed_and_cached() {
    let mock = MockCommerce::start().await;
    let client = mock.client();

    let products = client.list_products().await.unwrap();
    let again = client.list_products().await.unwrap();

    assert_eq!(products, again);
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Enamel Mug");
    assert_eq!(products[0].price.display(), "$12.00");
    assert_eq!(
        mock.requests()
            .iter()
            .filter(|r| *r == "GET /products")
            .count(),
        1
    );

    client.invalidate_catalog().await;
    client.list_products().await.unwrap();
    assert_eq!(
        mock.requests()
            .iter()
            .filter(|r| *r == "GET /products")
            .count(),
        2
    );
}
