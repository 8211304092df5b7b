//! JSON shapes exchanged with the commerce API.
//!
//! These mirror the provider's payloads and are converted to
//! `cartsync_core` types in [`super::conversions`] before leaving the module.

use cartsync_core::{CartId, Customer, LineItemId, OrderId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Responses
// =============================================================================

/// Monetary amount (`{ "raw": 12.5, "formatted_with_symbol": "$12.50" }`).
///
/// Only `raw` is read; display formatting is done locally.
#[derive(Debug, Clone, Deserialize)]
pub struct Money {
    pub raw: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Currency {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    #[serde(alias = "product_name")]
    pub name: String,
    /// Kept signed so a bad value surfaces as a contract error, not a parse error.
    pub quantity: i64,
    pub price: Money,
    pub line_total: Money,
    #[serde(default)]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cart {
    pub id: CartId,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub total_items: u32,
    #[serde(default)]
    pub total_unique_items: Option<u32>,
    #[serde(alias = "total_price")]
    pub subtotal: Money,
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// Mutation responses wrap the cart alongside event metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct CartEnvelope {
    pub cart: Cart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub image: Option<Image>,
}

/// Listing responses (`{ "data": [...] }`).
#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub customer_reference: Option<String>,
    pub customer: Customer,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub total: Money,
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created: Option<i64>,
}

/// `{ "error": { "message": "...", "type": "..." } }`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ErrorEnvelope {
    /// Decode an error body, returning `None` for anything else.
    pub fn decode(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
pub struct AddRequest<'a> {
    pub id: &'a ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct UpdateRequest {
    pub quantity: u32,
}
