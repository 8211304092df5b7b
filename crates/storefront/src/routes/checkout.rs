//! Checkout route handlers.
//!
//! A refused capture is answered with `200 OK` and the store's message in
//! `checkout_error`; the cart stays as it was. The only error response is a
//! failure to load a cart before the capture is sent.

use axum::{
    Json,
    extract::{Path, State},
};
use cartsync_core::{CheckoutDetails, CheckoutToken};
use serde::Serialize;
use tracing::instrument;

use super::views::{CartView, OrderView, ThemeView};
use crate::error::{JsonBody, Result, add_breadcrumb};
use crate::state::AppState;
use crate::sync::{CartSnapshot, CheckoutOutcome};

/// Checkout page payload.
#[derive(Debug, Serialize)]
pub struct CheckoutPage {
    pub cart: CartView,
    pub order: Option<OrderView>,
    pub checkout_error: Option<String>,
    pub revision: u64,
    pub theme: ThemeView,
}

impl CheckoutPage {
    fn new(snapshot: &CartSnapshot, theme: ThemeView) -> Self {
        Self {
            cart: CartView::from_snapshot(snapshot),
            order: snapshot.order().map(OrderView::from),
            checkout_error: snapshot.checkout_error().map(str::to_string),
            revision: snapshot.revision(),
            theme,
        }
    }
}

/// Display the checkout state.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CheckoutPage> {
    let theme = state.theme().lock().await.mode().into();
    Json(CheckoutPage::new(&state.cart().snapshot(), theme))
}

/// Capture a checkout for the cart.
///
/// The body carries customer, shipping, fulfillment and payment details.
/// Line items are not sent by the client: every line of the cart is captured
/// at its quantity once earlier cart operations have been applied.
#[instrument(skip(state, details))]
pub async fn capture(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonBody(details): JsonBody<CheckoutDetails>,
) -> Result<Json<CheckoutPage>> {
    add_breadcrumb("checkout", "Capture checkout", None);

    let outcome = state
        .cart()
        .capture_checkout(CheckoutToken::new(token), details)
        .await?;

    if let CheckoutOutcome::Failed { message, kind } = &outcome {
        tracing::info!(kind = ?kind, message = %message, "Checkout refused by store");
    }

    let theme = state.theme().lock().await.mode().into();
    Ok(Json(CheckoutPage::new(&state.cart().snapshot(), theme)))
}
