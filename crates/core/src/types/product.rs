//! Catalog product.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product from the remote catalog. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Plain-text or HTML description as the store returned it.
    pub description: Option<String>,
    pub price: Price,
    pub image_url: Option<String>,
}
