//! Remote cart gateway for the hosted commerce API.
//!
//! # Architecture
//!
//! - [`CartGateway`] is the seam between the cart controller and the store.
//!   Every operation is one request and returns the complete resulting cart.
//! - [`CommerceClient`] implements it over the JSON REST API with `reqwest`.
//! - The store is the source of truth - NO local merging, NO retries.
//! - Catalog listings are cached in-memory via `moka`; carts never are.
//!
//! # Errors
//!
//! Every failure maps to one of three [`ErrorKind`]s so callers can decide
//! what to show: the request never reached a usable answer (`Transport`), the
//! store refused the input (`Validation`), or the store refused the caller
//! (`Authorization`).
//!
//! # Example
//!
//! ```rust,ignore
//! use cartsync_storefront::commerce::{CartGateway, CommerceClient};
//!
//! let client = CommerceClient::new(&config.commerce, config.sync.catalog_cache_ttl);
//!
//! let cart = client.retrieve(None).await?;
//! let cart = client.add(&cart.id, &ProductId::new("prod_1"), Quantity::ONE).await?;
//! ```

mod client;
mod conversions;
mod wire;

pub use client::CommerceClient;

use async_trait::async_trait;
use cartsync_core::{
    Cart, CartId, CheckoutToken, LineItemId, OrderPayload, OrderReceipt, Product, ProductId,
    Quantity,
};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Operations against the remote cart store.
///
/// Implementations must not cache carts: the value returned by each call is
/// the store's authoritative state right after the request.
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// List the catalog in the store's order.
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError>;

    /// Fetch a cart, asking the store to create one when `cart` is `None`.
    async fn retrieve(&self, cart: Option<&CartId>) -> Result<Cart, GatewayError>;

    /// Add units of a product.
    async fn add(
        &self,
        cart: &CartId,
        product: &ProductId,
        quantity: Quantity,
    ) -> Result<Cart, GatewayError>;

    /// Set the quantity of an existing entry.
    async fn update(
        &self,
        cart: &CartId,
        item: &LineItemId,
        quantity: Quantity,
    ) -> Result<Cart, GatewayError>;

    /// Delete an entry.
    async fn remove(&self, cart: &CartId, item: &LineItemId) -> Result<Cart, GatewayError>;

    /// Delete every entry. The store may reissue the cart id.
    async fn empty(&self, cart: &CartId) -> Result<Cart, GatewayError>;

    /// Re-read the current state of a cart.
    async fn refresh(&self, cart: &CartId) -> Result<Cart, GatewayError>;

    /// Finalize a checkout into an order.
    async fn capture_checkout(
        &self,
        token: &CheckoutToken,
        payload: &OrderPayload,
    ) -> Result<OrderReceipt, GatewayError>;
}

/// Coarse classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failure, server failure, or an unreadable response.
    Transport,
    /// The store rejected the request (bad quantity, out of stock, ...).
    Validation,
    /// The store rejected the caller (bad key, expired checkout token).
    Authorization,
}

/// Errors that can occur when talking to the commerce API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response parsed but violates the cart contract.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Rate limited by the store.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The store failed while handling the request.
    #[error("Remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// The store rejected the request contents.
    #[error("Validation failed: {message}")]
    Validation {
        status: u16,
        message: String,
        error_type: Option<String>,
    },

    /// The store rejected the caller's credentials or token.
    #[error("Not authorized: {message}")]
    Authorization {
        status: u16,
        message: String,
        error_type: Option<String>,
    },
}

impl GatewayError {
    /// Which of the three failure families this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_)
            | Self::Parse(_)
            | Self::Malformed(_)
            | Self::RateLimited(_)
            | Self::Remote { .. } => ErrorKind::Transport,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Authorization { .. } => ErrorKind::Authorization,
        }
    }

    /// Message suitable for showing to a shopper.
    ///
    /// Remote errors carry the store's own wording; everything else falls
    /// back to the error's display text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. }
            | Self::Validation { message, .. }
            | Self::Authorization { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Build the error for a non-success response.
    ///
    /// The body is decoded as `{ "error": { "message", "type" } }` when
    /// possible; otherwise the status reason is used as the message.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let (message, error_type) = wire::ErrorEnvelope::decode(body).map_or_else(
            || {
                (
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string(),
                    None,
                )
            },
            |envelope| (envelope.error.message, envelope.error.kind),
        );
        let code = status.as_u16();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Authorization {
                status: code,
                message,
                error_type,
            },
            s if s.is_client_error() => Self::Validation {
                status: code,
                message,
                error_type,
            },
            _ => Self::Remote {
                status: code,
                message,
            },
        }
    }
}
