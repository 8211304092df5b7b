//! Cart and line item types.
//!
//! A [`Cart`] is always the complete state returned by the remote store. It is
//! replaced wholesale after every mutation; nothing here merges or recomputes
//! totals locally.

use serde::{Deserialize, Serialize};

use super::id::{CartId, LineItemId, ProductId};
use super::price::Price;
use super::quantity::Quantity;

/// One entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Store-issued id of this entry (used for update/remove).
    pub id: LineItemId,
    /// Product this entry refers to.
    pub product_id: ProductId,
    /// Product display name at the time the entry was added.
    pub name: String,
    /// Number of units, always at least one.
    pub quantity: Quantity,
    /// Price of a single unit.
    pub unit_price: Price,
    /// `unit_price * quantity` as computed by the store.
    pub subtotal: Price,
    /// Product image, if the store returned one.
    pub image_url: Option<String>,
}

/// Server-authoritative shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Store-issued cart token.
    pub id: CartId,
    /// Entries in the order the store returned them.
    pub line_items: Vec<LineItem>,
    /// Sum of all line item quantities.
    pub total_items: u32,
    /// Number of distinct entries.
    pub total_unique_items: u32,
    /// Cart subtotal.
    pub total_price: Price,
}

impl Cart {
    /// Whether the cart holds no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// All entries for a product.
    ///
    /// Stores that do not merge repeated adds can hold several entries for
    /// the same product.
    pub fn lines_for<'a>(&'a self, product: &'a ProductId) -> impl Iterator<Item = &'a LineItem> {
        self.line_items
            .iter()
            .filter(move |item| &item.product_id == product)
    }

    /// Total units of a product across every entry.
    #[must_use]
    pub fn quantity_of(&self, product: &ProductId) -> u32 {
        self.lines_for(product).map(|item| item.quantity.get()).sum()
    }
}
