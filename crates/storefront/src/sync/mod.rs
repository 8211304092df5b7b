//! Cart synchronization between the storefront and the remote store.
//!
//! # Components
//!
//! - [`CartController`] - cloneable handle used by views and the CLI
//! - `sequencer` - single worker applying operations one at a time, in order
//! - [`CartMirror`] / [`CartSnapshot`] - last store-confirmed cart, checkout
//!   result and checkout error, readable without waiting
//!
//! # Guarantees
//!
//! - The mirror is written only with carts returned by the store, never
//!   ahead of confirmation.
//! - Operations are applied in the order the queue accepted them, with at
//!   most one request in flight.
//! - Failed operations are reported to their own caller and never retried.
//! - Checkout capture failures become a stored message instead of an error.

mod controller;
mod sequencer;
mod snapshot;

pub use controller::CartController;
pub use snapshot::{CartMirror, CartSnapshot};

use cartsync_core::{Order, QuantityError};
use thiserror::Error;

use crate::commerce::{ErrorKind, GatewayError};

/// Errors returned by [`CartController`] operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected locally; no request was made.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    /// The store call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The sequencer is no longer running.
    #[error("Cart sequencer has shut down")]
    Closed,
}

impl SyncError {
    /// Gateway classification, if this error came from the store.
    #[must_use]
    pub const fn gateway_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Gateway(e) => Some(e.kind()),
            Self::InvalidQuantity(_) | Self::Closed => None,
        }
    }
}

/// Result of a checkout capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The store created an order.
    Captured(Box<Order>),
    /// The store refused the capture; the message is also in the snapshot.
    Failed { message: String, kind: ErrorKind },
}

impl CheckoutOutcome {
    /// The captured order, if any.
    #[must_use]
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Captured(order) => Some(order),
            Self::Failed { .. } => None,
        }
    }
}
