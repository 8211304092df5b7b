//! Public handle to the cart sequencer.

use std::sync::Arc;

use cartsync_core::{
    Cart, CartId, CheckoutDetails, CheckoutToken, LineItemId, Product, ProductId, Quantity,
    QuantityError,
};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::instrument;

use crate::commerce::CartGateway;

use super::sequencer::{CartOp, Command, Sequencer};
use super::snapshot::{CartMirror, CartSnapshot};
use super::{CheckoutOutcome, SyncError};

/// Cart Synchronization Controller.
///
/// Cheap to clone; all clones feed the same queue and read the same mirror.
/// The worker task stops once every clone has been dropped and the queue is
/// drained.
///
/// Quantities are validated here, so a rejected quantity never reaches the
/// store. The rejection is still queued: like any attempted mutation it
/// clears the checkout error, in issuance order.
#[derive(Clone)]
pub struct CartController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    commands: mpsc::Sender<Command>,
    gateway: Arc<dyn CartGateway>,
    mirror: CartMirror,
}

impl CartController {
    /// Start the sequencer on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `queue_capacity` is zero or if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(gateway: Arc<dyn CartGateway>, queue_capacity: usize) -> Self {
        let (commands, queue) = mpsc::channel(queue_capacity);
        let (state, rx) = watch::channel(CartSnapshot::default());

        tokio::spawn(Sequencer::new(Arc::clone(&gateway), state).run(queue));

        Self {
            inner: Arc::new(ControllerInner {
                commands,
                gateway,
                mirror: CartMirror::new(rx),
            }),
        }
    }

    /// Read access to the mirrored state.
    #[must_use]
    pub fn mirror(&self) -> CartMirror {
        self.inner.mirror.clone()
    }

    /// Copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.mirror.snapshot()
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List the catalog.
    ///
    /// Not sequenced: catalog reads have no ordering relation to cart
    /// operations.
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, SyncError> {
        Ok(self.inner.gateway.list_products().await?)
    }

    // =========================================================================
    // Cart operations
    // =========================================================================

    /// Load the current cart, creating one on the store if none is known.
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged, or `Closed` if the sequencer stopped.
    pub async fn retrieve(&self) -> Result<Cart, SyncError> {
        self.run(CartOp::Retrieve(None)).await
    }

    /// Load a specific cart and make it the mirrored one.
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged, or `Closed` if the sequencer stopped.
    pub async fn resume(&self, cart: CartId) -> Result<Cart, SyncError> {
        self.run(CartOp::Retrieve(Some(cart))).await
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for quantities below one without contacting
    /// the store, otherwise the gateway error unchanged.
    pub async fn add(&self, product: ProductId, quantity: i64) -> Result<Cart, SyncError> {
        match Quantity::new(quantity) {
            Ok(quantity) => self.run(CartOp::Add { product, quantity }).await,
            Err(e) => self.reject(e).await,
        }
    }

    /// Set the quantity of a cart entry. Zero removes the entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for negative quantities without contacting
    /// the store, otherwise the gateway error unchanged.
    pub async fn update(&self, item: LineItemId, quantity: i64) -> Result<Cart, SyncError> {
        if quantity == 0 {
            return self.remove(item).await;
        }
        match Quantity::new(quantity) {
            Ok(quantity) => self.run(CartOp::Update { item, quantity }).await,
            Err(e) => self.reject(e).await,
        }
    }

    /// Remove a cart entry.
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged, or `Closed` if the sequencer stopped.
    pub async fn remove(&self, item: LineItemId) -> Result<Cart, SyncError> {
        self.run(CartOp::Remove { item }).await
    }

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged, or `Closed` if the sequencer stopped.
    pub async fn empty(&self) -> Result<Cart, SyncError> {
        self.run(CartOp::Empty).await
    }

    /// Re-read the mirrored cart from the store.
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged, or `Closed` if the sequencer stopped.
    pub async fn refresh(&self) -> Result<Cart, SyncError> {
        self.run(CartOp::Refresh).await
    }

    /// Capture a checkout for every line of the cart.
    ///
    /// The line items are read when the capture reaches the front of the
    /// queue, so operations issued before it are included. A refused capture
    /// is not an error: it comes back as [`CheckoutOutcome::Failed`] and its
    /// message is stored in the snapshot. The cart is reloaded either way.
    ///
    /// # Errors
    ///
    /// Returns an error only if no cart could be loaded to capture from, or
    /// if the sequencer stopped.
    pub async fn capture_checkout(
        &self,
        token: CheckoutToken,
        details: CheckoutDetails,
    ) -> Result<CheckoutOutcome, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(Command::Checkout {
            token,
            details: Box::new(details),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SyncError::Closed)?
    }

    async fn reject(&self, error: QuantityError) -> Result<Cart, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(Command::Rejected {
            error: error.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SyncError::Closed)?
    }

    async fn run(&self, op: CartOp) -> Result<Cart, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(Command::Cart { op, reply }).await?;
        rx.await.map_err(|_| SyncError::Closed)?
    }

    async fn enqueue(&self, command: Command) -> Result<(), SyncError> {
        self.inner
            .commands
            .send(command)
            .await
            .map_err(|_| SyncError::Closed)
    }
}
