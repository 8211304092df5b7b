//! JSON view models shared by the route handlers.
//!
//! Views are derived from the mirrored snapshot only. Prices are preformatted
//! for display; raw amounts stay available on the domain types.

use cartsync_core::{Cart, LineItem, Order, Product, ThemeMode};
use serde::Serialize;

use crate::sync::CartSnapshot;

/// Cart item display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

impl From<&LineItem> for CartItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            quantity: item.quantity.get(),
            price: item.unit_price.display(),
            line_price: item.subtotal.display(),
            image_url: item.image_url.clone(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: Option<String>,
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    pub unique_item_count: u32,
}

impl CartView {
    /// Placeholder shown before the first cart has loaded.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: None,
            items: Vec::new(),
            subtotal: "$0.00".to_string(),
            item_count: 0,
            unique_item_count: 0,
        }
    }

    #[must_use]
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        snapshot.cart().map_or_else(Self::empty, Self::from)
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            id: Some(cart.id.to_string()),
            items: cart.line_items.iter().map(CartItemView::from).collect(),
            subtotal: cart.total_price.display(),
            item_count: cart.total_items,
            unique_item_count: cart.total_unique_items,
        }
    }
}

/// Product card display data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            image_url: product.image_url.clone(),
        }
    }
}

/// Captured order display data.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: String,
    pub reference: Option<String>,
    pub email: String,
    pub total: String,
    pub captured_at: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let receipt = order.receipt();
        Self {
            id: order.id().to_string(),
            reference: receipt.customer_reference.clone(),
            email: receipt.customer.email.clone(),
            total: receipt.total.display(),
            captured_at: receipt.captured_at.to_rfc3339(),
        }
    }
}

/// Theme flag display data.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThemeView {
    pub mode: ThemeMode,
    pub dark: bool,
}

impl From<ThemeMode> for ThemeView {
    fn from(mode: ThemeMode) -> Self {
        Self {
            mode,
            dark: mode.is_dark(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use cartsync_core::{CartId, CurrencyCode, LineItemId, Price, ProductId, Quantity};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_cart_view_formats_prices() {
        let cart = Cart {
            id: CartId::new("cart_1"),
            line_items: vec![LineItem {
                id: LineItemId::new("item_1"),
                product_id: ProductId::new("prod_1"),
                name: "Mug".to_string(),
                quantity: Quantity::new(3).unwrap(),
                unit_price: Price::new(Decimal::new(450, 2), CurrencyCode::USD),
                subtotal: Price::new(Decimal::new(1350, 2), CurrencyCode::USD),
                image_url: None,
            }],
            total_items: 3,
            total_unique_items: 1,
            total_price: Price::new(Decimal::new(1350, 2), CurrencyCode::USD),
        };

        let view = CartView::from(&cart);
        assert_eq!(view.id.as_deref(), Some("cart_1"));
        assert_eq!(view.items[0].price, "$4.50");
        assert_eq!(view.items[0].line_price, "$13.50");
        assert_eq!(view.subtotal, "$13.50");
        assert_eq!(view.item_count, 3);
    }

    #[test]
    fn test_cart_view_before_first_load() {
        let view = CartView::from_snapshot(&CartSnapshot::default());
        assert!(view.id.is_none());
        assert_eq!(view.item_count, 0);
    }

    #[test]
    fn test_theme_view_serializes_flag() {
        let json = serde_json::to_value(ThemeView::from(ThemeMode::Dark)).unwrap();
        assert_eq!(json["mode"], "dark");
        assert_eq!(json["dark"], true);
    }
}
