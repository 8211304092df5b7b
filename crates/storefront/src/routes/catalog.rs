//! Catalog route handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use super::views::{ProductView, ThemeView};
use crate::error::Result;
use crate::state::AppState;

/// Catalog page payload.
#[derive(Debug, Serialize)]
pub struct CatalogPage {
    pub products: Vec<ProductView>,
    /// Badge count, taken from the mirror without waiting on the store.
    pub cart_item_count: u32,
    pub theme: ThemeView,
}

/// Display the product listing.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<CatalogPage>> {
    let products = state.cart().list_products().await?;

    Ok(Json(CatalogPage {
        products: products.iter().map(ProductView::from).collect(),
        cart_item_count: state.cart().snapshot().total_items(),
        theme: state.theme().lock().await.mode().into(),
    }))
}
