//! Domain types for cartsync.
//!
//! This module provides type-safe wrappers for storefront concepts.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod quantity;
pub mod theme;

pub use cart::{Cart, LineItem};
pub use id::*;
pub use order::{
    CheckoutDetails, Customer, Fulfillment, Order, OrderLineSelection, OrderPayload, OrderReceipt,
    ShippingAddress,
};
pub use price::{CurrencyCode, Price, UnsupportedCurrency};
pub use product::Product;
pub use quantity::{Quantity, QuantityError};
pub use theme::ThemeMode;
