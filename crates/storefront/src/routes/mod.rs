//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                          - Catalog (products, cart badge, theme)
//! GET    /health                    - Health check
//!
//! # Cart
//! GET    /cart                      - Mirrored cart
//! POST   /cart/items                - Add { product_id, quantity }
//! PUT    /cart/items/{line_item_id} - Update { quantity } (0 removes)
//! DELETE /cart/items/{line_item_id} - Remove item
//! DELETE /cart/items                - Empty cart
//! POST   /cart/refresh              - Re-read cart from the store
//!
//! # Checkout
//! GET    /checkout                  - Cart, last order, checkout error
//! POST   /checkout/{token}          - Capture checkout
//!
//! # Preferences
//! GET    /preferences/theme         - Theme flag
//! POST   /preferences/theme/toggle  - Flip and persist theme flag
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod preferences;
pub mod views;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add).delete(cart::empty))
        .route(
            "/items/{line_item_id}",
            put(cart::update).delete(cart::remove),
        )
        .route("/refresh", post(cart::refresh))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/{token}", post(checkout::capture))
}

/// Create the preference routes router.
pub fn preference_routes() -> Router<AppState> {
    Router::new()
        .route("/theme", get(preferences::show))
        .route("/theme/toggle", post(preferences::toggle))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/", get(catalog::index))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
        // Preferences
        .nest("/preferences", preference_routes())
}
