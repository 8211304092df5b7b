//! Command implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod theme;

use std::sync::Arc;

use cartsync_core::{Cart, CartId};
use cartsync_storefront::commerce::{CartGateway, CommerceClient};
use cartsync_storefront::config::{CommerceConfig, SyncConfig};
use cartsync_storefront::sync::CartController;
use tracing::info;

/// Start a controller against the configured store.
///
/// # Errors
///
/// Returns an error if the commerce configuration is missing or invalid.
pub fn controller() -> Result<CartController, Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let commerce = CommerceConfig::from_env()?;
    let sync = SyncConfig::from_env()?;
    let gateway: Arc<dyn CartGateway> =
        Arc::new(CommerceClient::new(&commerce, sync.catalog_cache_ttl));

    Ok(CartController::spawn(gateway, sync.queue_capacity))
}

/// Start a controller and load the requested cart, or a new one.
///
/// # Errors
///
/// Returns an error if configuration fails or the store rejects the cart.
pub async fn connect(
    cart: Option<String>,
) -> Result<(CartController, Cart), Box<dyn std::error::Error>> {
    let controller = controller()?;
    let loaded = match cart {
        Some(id) => controller.resume(CartId::new(id)).await?,
        None => {
            let cart = controller.retrieve().await?;
            info!("Created cart {} (pass --cart {} to reuse it)", cart.id, cart.id);
            cart
        }
    };
    Ok((controller, loaded))
}

/// Log a cart, one line per item.
pub fn print_cart(cart: &Cart) {
    info!("Cart {}", cart.id);
    if cart.is_empty() {
        info!("  (empty)");
    }
    for item in &cart.line_items {
        info!(
            "  {} x{} {} @ {} = {}  [line {}]",
            item.product_id, item.quantity, item.name, item.unit_price, item.subtotal, item.id
        );
    }
    info!(
        "  {} items ({} unique), subtotal {}",
        cart.total_items, cart.total_unique_items, cart.total_price
    );
}
