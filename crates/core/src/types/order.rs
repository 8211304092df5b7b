//! Checkout capture payload and the resulting order.
//!
//! [`OrderPayload`] is what the storefront sends when finalizing a checkout.
//! [`OrderReceipt`] is what the store answers with, and [`Order`] binds that
//! receipt to the checkout token and the cart snapshot it was captured from.
//! An order is terminal: it exposes no mutators.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::{Cart, LineItem};
use super::id::{CheckoutToken, LineItemId, OrderId};
use super::price::Price;
use super::quantity::Quantity;

/// Buyer contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

/// Shipping destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub town_city: String,
    pub county_state: String,
    pub postal_zip_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

/// Chosen fulfillment option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    /// Store-issued shipping method id.
    pub shipping_method: String,
}

/// Quantity to capture for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineSelection {
    pub quantity: Quantity,
}

/// Everything a capture needs besides the line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub customer: Customer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment: Option<Fulfillment>,
    /// Payment gateway details, forwarded to the store untouched.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payment: serde_json::Value,
}

impl CheckoutDetails {
    /// Details with only the buyer filled in.
    #[must_use]
    pub const fn new(customer: Customer) -> Self {
        Self {
            customer,
            shipping: None,
            fulfillment: None,
            payment: serde_json::Value::Null,
        }
    }

    /// Attach a fulfillment option.
    #[must_use]
    pub fn with_fulfillment(mut self, fulfillment: Fulfillment) -> Self {
        self.fulfillment = Some(fulfillment);
        self
    }
}

/// Body of a checkout capture request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    /// Line items to capture, keyed by line item id.
    pub line_items: BTreeMap<LineItemId, OrderLineSelection>,
    #[serde(flatten)]
    pub details: CheckoutDetails,
}

impl OrderPayload {
    /// Build a payload that captures every line of `cart` at its current
    /// quantity.
    #[must_use]
    pub fn for_cart(cart: &Cart, details: CheckoutDetails) -> Self {
        Self {
            line_items: cart
                .line_items
                .iter()
                .map(|item| {
                    (
                        item.id.clone(),
                        OrderLineSelection {
                            quantity: item.quantity,
                        },
                    )
                })
                .collect(),
            details,
        }
    }
}

/// What the store returns from a successful capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub id: OrderId,
    /// Human-facing order reference (e.g. "ORD-12345").
    pub customer_reference: Option<String>,
    pub customer: Customer,
    pub line_items: Vec<LineItem>,
    pub total: Price,
    pub captured_at: DateTime<Utc>,
}

/// A captured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(flatten)]
    receipt: OrderReceipt,
    checkout_token: CheckoutToken,
    cart: Cart,
}

impl Order {
    /// Bind a capture receipt to the token and cart it was captured from.
    #[must_use]
    pub const fn new(receipt: OrderReceipt, checkout_token: CheckoutToken, cart: Cart) -> Self {
        Self {
            receipt,
            checkout_token,
            cart,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &OrderId {
        &self.receipt.id
    }

    #[must_use]
    pub const fn receipt(&self) -> &OrderReceipt {
        &self.receipt
    }

    /// The checkout token this order was captured with.
    #[must_use]
    pub const fn checkout_token(&self) -> &CheckoutToken {
        &self.checkout_token
    }

    /// The cart as it stood when the capture was issued.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }
}
