//! Integration tests for checkout capture.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use cartsync_core::{CheckoutDetails, CheckoutToken, Customer, Fulfillment, ProductId};
use cartsync_integration_tests::MockCommerce;
use cartsync_storefront::commerce::ErrorKind;
use cartsync_storefront::sync::CheckoutOutcome;

fn details() -> CheckoutDetails {
    CheckoutDetails::new(Customer {
        firstname: "Ada".to_string(),
        lastname: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
    })
    .with_fulfillment(Fulfillment {
        shipping_method: "ship_standard".to_string(),
    })
}

#[tokio::test]
async fn test_capture_records_order_and_starts_new_cart() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    let before = cart.add(ProductId::new("prod_mug"), 2).await.unwrap();

    let outcome = cart
        .capture_checkout(CheckoutToken::new("chkt_ok"), details())
        .await
        .unwrap();

    let order = outcome.order().unwrap();
    assert_eq!(order.id().as_str(), "ord_1");
    assert_eq!(order.receipt().customer_reference.as_deref(), Some("ORD-00001"));
    assert_eq!(order.receipt().customer.email, "ada@example.com");
    assert_eq!(order.cart(), &before);

    let captured = mock.captured_orders();
    let item = before.line_items[0].id.as_str();
    assert_eq!(captured[0]["line_items"][item]["quantity"], 2);
    assert_eq!(captured[0]["customer"]["email"], "ada@example.com");
    assert_eq!(captured[0]["fulfillment"]["shipping_method"], "ship_standard");

    let snapshot = cart.snapshot();
    assert_eq!(snapshot.order(), Some(order));
    assert!(snapshot.checkout_error().is_none());
    let fresh = snapshot.cart().unwrap();
    assert_ne!(fresh.id, before.id);
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn test_capture_waits_for_earlier_add() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    cart.add(ProductId::new("prod_mug"), 1).await.unwrap();

    // Slow add issued first, capture right behind it
    mock.script_delays(&[150]);
    let (added, outcome) = tokio::join!(
        cart.add(ProductId::new("prod_tee"), 1),
        cart.capture_checkout(CheckoutToken::new("chkt_ok"), details()),
    );
    let added = added.unwrap();
    let order = outcome.unwrap().order().cloned().unwrap();

    let sent = mock.captured_orders()[0]["line_items"]
        .as_object()
        .unwrap()
        .len();
    assert_eq!(sent, 2);
    assert_eq!(order.cart(), &added);
    assert_eq!(order.cart().line_items.len(), sent);
}

#[tokio::test]
async fn test_expired_token_sets_error_and_keeps_cart() {
    let mock = MockCommerce::start().await;
    mock.expire_token("chkt_expired");
    let cart = mock.controller();
    let before = cart.add(ProductId::new("prod_tee"), 1).await.unwrap();

    let outcome = cart
        .capture_checkout(CheckoutToken::new("chkt_expired"), details())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CheckoutOutcome::Failed {
            message: "Checkout token has expired".to_string(),
            kind: ErrorKind::Authorization,
        }
    );
    let snapshot = cart.snapshot();
    assert_eq!(snapshot.checkout_error(), Some("Checkout token has expired"));
    assert!(snapshot.order().is_none());
    assert_eq!(snapshot.cart(), Some(&before));
    assert!(mock.captured_orders().is_empty());
}

#[tokio::test]
async fn test_store_outage_during_capture_is_transport_failure() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();
    let before = cart.add(ProductId::new("prod_mug"), 1).await.unwrap();

    mock.fail_next(StatusCode::SERVICE_UNAVAILABLE, "Payment processor unavailable");
    let outcome = cart
        .capture_checkout(CheckoutToken::new("chkt_ok"), details())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CheckoutOutcome::Failed {
            message: "Payment processor unavailable".to_string(),
            kind: ErrorKind::Transport,
        }
    );
    assert_eq!(
        cart.snapshot().checkout_error(),
        Some("Payment processor unavailable")
    );
    assert_eq!(cart.snapshot().cart(), Some(&before));
    assert!(mock.captured_orders().is_empty());
}

#[tokio::test]
async fn test_checkout_error_cleared_by_next_mutation() {
    let mock = MockCommerce::start().await;
    mock.expire_token("chkt_expired");
    let cart = mock.controller();
    cart.add(ProductId::new("prod_tee"), 1).await.unwrap();
    cart.capture_checkout(CheckoutToken::new("chkt_expired"), details())
        .await
        .unwrap();

    cart.refresh().await.unwrap();
    assert!(cart.snapshot().checkout_error().is_some());

    cart.add(ProductId::new("prod_mug"), 1).await.unwrap();
    assert!(cart.snapshot().checkout_error().is_none());
}

#[tokio::test]
async fn test_new_error_overwrites_previous_one() {
    let mock = MockCommerce::start().await;
    mock.expire_token("chkt_expired");
    let cart = mock.controller();
    cart.add(ProductId::new("prod_mug"), 1).await.unwrap();

    // Two refused captures with nothing in between
    cart.capture_checkout(CheckoutToken::new("chkt_expired"), details())
        .await
        .unwrap();
    assert_eq!(
        cart.snapshot().checkout_error(),
        Some("Checkout token has expired")
    );

    mock.fail_next(StatusCode::UNPROCESSABLE_ENTITY, "Card declined");
    let second = cart
        .capture_checkout(CheckoutToken::new("chkt_ok"), details())
        .await
        .unwrap();

    assert!(matches!(
        second,
        CheckoutOutcome::Failed {
            kind: ErrorKind::Validation,
            ..
        }
    ));
    assert_eq!(cart.snapshot().checkout_error(), Some("Card declined"));
}

#[tokio::test]
async fn test_empty_cart_capture_is_refused() {
    let mock = MockCommerce::start().await;
    let cart = mock.controller();

    let outcome = cart
        .capture_checkout(CheckoutToken::new("chkt_ok"), details())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CheckoutOutcome::Failed {
            message: "The checkout has no line items".to_string(),
            kind: ErrorKind::Validation,
        }
    );
    assert!(cart.snapshot().cart().unwrap().is_empty());
}
