//! Immutable view state published by the cart sequencer.
//!
//! Every change is expressed as a pure function from the current snapshot to
//! the next one. The sequencer is the only caller; readers get clones through
//! [`CartMirror`].

use cartsync_core::{Cart, Order};
use tokio::sync::watch;

/// Last confirmed cart plus checkout results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    cart: Option<Cart>,
    order: Option<Order>,
    checkout_error: Option<String>,
    revision: u64,
}

impl CartSnapshot {
    /// Last cart confirmed by the store, if one has been loaded.
    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// Most recently captured order.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Message from the last failed checkout capture.
    #[must_use]
    pub fn checkout_error(&self) -> Option<&str> {
        self.checkout_error.as_deref()
    }

    /// Number of changes published so far.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Units in the mirrored cart, zero before the first load.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.cart.as_ref().map_or(0, |c| c.total_items)
    }

    /// Replace the cart with a store response.
    #[must_use]
    pub fn with_cart(&self, cart: Cart) -> Self {
        Self {
            cart: Some(cart),
            revision: self.revision + 1,
            ..self.clone()
        }
    }

    /// Forget the cart, so the next operation loads a new one.
    #[must_use]
    pub fn without_cart(&self) -> Self {
        if self.cart.is_none() {
            return self.clone();
        }
        Self {
            cart: None,
            revision: self.revision + 1,
            ..self.clone()
        }
    }

    /// Record a captured order.
    #[must_use]
    pub fn with_order(&self, order: Order) -> Self {
        Self {
            order: Some(order),
            revision: self.revision + 1,
            ..self.clone()
        }
    }

    /// Overwrite the checkout error.
    #[must_use]
    pub fn with_checkout_error(&self, message: impl Into<String>) -> Self {
        Self {
            checkout_error: Some(message.into()),
            revision: self.revision + 1,
            ..self.clone()
        }
    }

    /// Clear the checkout error. Unchanged when there is none.
    #[must_use]
    pub fn without_checkout_error(&self) -> Self {
        if self.checkout_error.is_none() {
            return self.clone();
        }
        Self {
            checkout_error: None,
            revision: self.revision + 1,
            ..self.clone()
        }
    }
}

/// Read side of the published snapshot.
///
/// Reads never wait on the sequencer: they copy whatever was last published.
/// A clone starts from the present, so its first [`CartMirror::changed`]
/// waits for a change published after the clone was made.
#[derive(Debug)]
pub struct CartMirror {
    rx: watch::Receiver<CartSnapshot>,
}

impl Clone for CartMirror {
    fn clone(&self) -> Self {
        let mut rx = self.rx.clone();
        rx.mark_unchanged();
        Self { rx }
    }
}

impl CartMirror {
    pub(crate) const fn new(rx: watch::Receiver<CartSnapshot>) -> Self {
        Self { rx }
    }

    /// Copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.rx.borrow().clone()
    }

    /// Copy of the current cart.
    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.rx.borrow().cart().cloned()
    }

    /// Wait for the next published change and return it.
    ///
    /// Returns `None` once the sequencer has stopped.
    pub async fn changed(&mut self) -> Option<CartSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
