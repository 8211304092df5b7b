//! Cart commands.

use cartsync_core::{LineItemId, ProductId};

use super::{connect, print_cart};

/// Show the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded.
pub async fn show(cart: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let (_, loaded) = connect(cart).await?;
    print_cart(&loaded);
    Ok(())
}

/// Add units of a product.
///
/// # Errors
///
/// Returns an error for quantities below one or if the store rejects the add.
pub async fn add(
    cart: Option<String>,
    product_id: String,
    quantity: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let (controller, _) = connect(cart).await?;
    let updated = controller.add(ProductId::new(product_id), quantity).await?;
    print_cart(&updated);
    Ok(())
}

/// Set a line item's quantity.
///
/// # Errors
///
/// Returns an error for negative quantities or if the store rejects the update.
pub async fn update(
    cart: Option<String>,
    line_item_id: String,
    quantity: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let (controller, _) = connect(cart).await?;
    let updated = controller
        .update(LineItemId::new(line_item_id), quantity)
        .await?;
    print_cart(&updated);
    Ok(())
}

/// Remove a line item.
///
/// # Errors
///
/// Returns an error if the store rejects the removal.
pub async fn remove(
    cart: Option<String>,
    line_item_id: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let (controller, _) = connect(cart).await?;
    let updated = controller.remove(LineItemId::new(line_item_id)).await?;
    print_cart(&updated);
    Ok(())
}

/// Remove every line item.
///
/// # Errors
///
/// Returns an error if the store rejects the request.
pub async fn empty(cart: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let (controller, _) = connect(cart).await?;
    let updated = controller.empty().await?;
    print_cart(&updated);
    Ok(())
}

/// Re-read the cart from the store.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded.
pub async fn refresh(cart: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let (controller, _) = connect(cart).await?;
    let refreshed = controller.refresh().await?;
    print_cart(&refreshed);
    Ok(())
}
