//! Catalog listing.

use tracing::info;

use super::controller;

/// List the catalog.
///
/// # Errors
///
/// Returns an error if configuration fails or the store cannot be reached.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let products = controller()?.list_products().await?;

    info!("{} products", products.len());
    for product in &products {
        info!("  {}  {}  {}", product.id, product.price, product.name);
    }

    Ok(())
}
