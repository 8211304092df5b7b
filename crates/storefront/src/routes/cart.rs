//! Cart route handlers.
//!
//! Every handler goes through the cart controller, so requests from any
//! number of clients are applied to the store one at a time, in arrival
//! order. Responses carry the cart the store returned for that request.

use axum::{
    Json,
    extract::{Path, State},
};
use cartsync_core::{LineItemId, ProductId, ThemeMode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::views::{CartView, ThemeView};
use crate::error::{JsonBody, Result, add_breadcrumb};
use crate::state::AppState;

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    /// Defaults to a single unit.
    pub quantity: Option<i64>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Cart page payload.
#[derive(Debug, Serialize)]
pub struct CartPage {
    pub cart: CartView,
    /// Increases with every change to the mirrored state.
    pub revision: u64,
    pub theme: ThemeView,
}

async fn theme(state: &AppState) -> ThemeMode {
    state.theme().lock().await.mode()
}

/// Display the mirrored cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartPage> {
    let snapshot = state.cart().snapshot();
    Json(CartPage {
        cart: CartView::from_snapshot(&snapshot),
        revision: snapshot.revision(),
        theme: theme(&state).await.into(),
    })
}

/// Add item to cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AddToCartRequest>,
) -> Result<Json<CartView>> {
    add_breadcrumb(
        "cart",
        "Add to cart",
        Some(&[("product_id", request.product_id.as_str())]),
    );

    let cart = state
        .cart()
        .add(
            ProductId::new(request.product_id),
            request.quantity.unwrap_or(1),
        )
        .await?;

    Ok(Json(CartView::from(&cart)))
}

/// Update cart item quantity. Zero removes the item.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(line_item_id): Path<String>,
    JsonBody(request): JsonBody<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    add_breadcrumb(
        "cart",
        "Update quantity",
        Some(&[("line_item_id", line_item_id.as_str())]),
    );

    let cart = state
        .cart()
        .update(LineItemId::new(line_item_id), request.quantity)
        .await?;

    Ok(Json(CartView::from(&cart)))
}

/// Remove item from cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(line_item_id): Path<String>,
) -> Result<Json<CartView>> {
    add_breadcrumb(
        "cart",
        "Remove from cart",
        Some(&[("line_item_id", line_item_id.as_str())]),
    );

    let cart = state.cart().remove(LineItemId::new(line_item_id)).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove every item.
#[instrument(skip(state))]
pub async fn empty(State(state): State<AppState>) -> Result<Json<CartView>> {
    add_breadcrumb("cart", "Empty cart", None);

    let cart = state.cart().empty().await?;
    Ok(Json(CartView::from(&cart)))
}

/// Re-read the cart from the store.
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> Result<Json<CartView>> {
    let cart = state.cart().refresh().await?;
    Ok(Json(CartView::from(&cart)))
}
