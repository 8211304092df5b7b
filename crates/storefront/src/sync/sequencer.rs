//! Single-worker queue that applies cart operations in issuance order.
//!
//! Callers enqueue a [`Command`] on a bounded `mpsc` channel and wait on a
//! `oneshot` for their own result. One task drains the channel and awaits
//! each gateway call before taking the next command, so at most one request
//! is ever in flight and snapshot updates land in the order commands were
//! accepted. A failed command leaves the mirrored cart as it was and does not
//! stop the loop.

use std::sync::Arc;

use cartsync_core::{
    Cart, CartId, CheckoutDetails, CheckoutToken, LineItemId, Order, OrderPayload, ProductId,
    Quantity,
};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::commerce::{CartGateway, GatewayError};

use super::snapshot::CartSnapshot;
use super::{CheckoutOutcome, SyncError};

/// A cart-changing (or cart-reading) operation.
#[derive(Debug, Clone)]
pub enum CartOp {
    /// Load a cart: `Some` resumes a known cart, `None` loads the current
    /// one or asks the store for a new one.
    Retrieve(Option<CartId>),
    Add { product: ProductId, quantity: Quantity },
    Update { item: LineItemId, quantity: Quantity },
    Remove { item: LineItemId },
    Empty,
    Refresh,
}

impl CartOp {
    const fn name(&self) -> &'static str {
        match self {
            Self::Retrieve(_) => "retrieve",
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
            Self::Empty => "empty",
            Self::Refresh => "refresh",
        }
    }

    const fn is_mutation(&self) -> bool {
        !matches!(self, Self::Retrieve(_) | Self::Refresh)
    }
}

/// Queued work with its reply channel.
pub enum Command {
    Cart {
        op: CartOp,
        reply: oneshot::Sender<Result<Cart, SyncError>>,
    },
    Checkout {
        token: CheckoutToken,
        details: Box<CheckoutDetails>,
        reply: oneshot::Sender<Result<CheckoutOutcome, SyncError>>,
    },
    /// A mutation refused before reaching the store. It still counts as an
    /// attempt, so it takes its place in the queue.
    Rejected {
        error: SyncError,
        reply: oneshot::Sender<Result<Cart, SyncError>>,
    },
}

/// Owner of the write side of the snapshot.
pub struct Sequencer {
    gateway: Arc<dyn CartGateway>,
    state: watch::Sender<CartSnapshot>,
    next_seq: u64,
}

impl Sequencer {
    pub fn new(gateway: Arc<dyn CartGateway>, state: watch::Sender<CartSnapshot>) -> Self {
        Self {
            gateway,
            state,
            next_seq: 0,
        }
    }

    /// Drain the queue until every sender is gone.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!("Cart sequencer started");

        while let Some(command) = commands.recv().await {
            let seq = self.next_seq;
            self.next_seq += 1;

            match command {
                Command::Cart { op, reply } => {
                    let span = info_span!("cart_op", seq, op = op.name());
                    let result = self.apply(op).instrument(span).await;
                    if reply.send(result).is_err() {
                        debug!(seq, "Caller stopped waiting; result is still in the mirror");
                    }
                }
                Command::Checkout {
                    token,
                    details,
                    reply,
                } => {
                    let span = info_span!("checkout_capture", seq, checkout_token = %token);
                    let result = self.capture(token, *details).instrument(span).await;
                    if reply.send(result).is_err() {
                        debug!(seq, "Caller stopped waiting; result is still in the mirror");
                    }
                }
                Command::Rejected { error, reply } => {
                    debug!(seq, error = %error, "Cart operation rejected locally");
                    self.publish(CartSnapshot::without_checkout_error);
                    if reply.send(Err(error)).is_err() {
                        debug!(seq, "Caller stopped waiting for rejection");
                    }
                }
            }
        }

        info!("Cart sequencer stopped");
    }

    /// Apply a pure update to the published snapshot.
    ///
    /// Subscribers are only notified when the update changed something.
    fn publish(&self, update: impl FnOnce(&CartSnapshot) -> CartSnapshot) {
        self.state.send_if_modified(|current| {
            let next = update(current);
            if next == *current {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn current_cart_id(&self) -> Option<CartId> {
        self.state.borrow().cart().map(|c| c.id.clone())
    }

    fn current_cart(&self) -> Option<Cart> {
        self.state.borrow().cart().cloned()
    }

    fn accept(&self, cart: Cart) -> Cart {
        debug!(cart_id = %cart.id, total_items = cart.total_items, "Cart confirmed by store");
        self.publish(|s| s.with_cart(cart.clone()));
        cart
    }

    /// The mirrored cart, loading one first if none is known yet.
    async fn ensure_cart(&self) -> Result<Cart, GatewayError> {
        if let Some(cart) = self.current_cart() {
            return Ok(cart);
        }
        let cart = self.gateway.retrieve(None).await?;
        Ok(self.accept(cart))
    }

    async fn apply(&self, op: CartOp) -> Result<Cart, SyncError> {
        if op.is_mutation() {
            self.publish(CartSnapshot::without_checkout_error);
        }

        match self.call(op).await {
            Ok(cart) => Ok(self.accept(cart)),
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "Cart operation failed");
                Err(e.into())
            }
        }
    }

    async fn call(&self, op: CartOp) -> Result<Cart, GatewayError> {
        let gateway = self.gateway.as_ref();
        match op {
            CartOp::Retrieve(Some(id)) => gateway.retrieve(Some(&id)).await,
            CartOp::Retrieve(None) => {
                let current = self.current_cart_id();
                gateway.retrieve(current.as_ref()).await
            }
            CartOp::Refresh => match self.current_cart_id() {
                Some(id) => gateway.refresh(&id).await,
                None => gateway.retrieve(None).await,
            },
            CartOp::Add { product, quantity } => {
                let id = self.ensure_cart().await?.id;
                gateway.add(&id, &product, quantity).await
            }
            CartOp::Update { item, quantity } => {
                let id = self.ensure_cart().await?.id;
                gateway.update(&id, &item, quantity).await
            }
            CartOp::Remove { item } => {
                let id = self.ensure_cart().await?.id;
                gateway.remove(&id, &item).await
            }
            CartOp::Empty => {
                let id = self.ensure_cart().await?.id;
                gateway.empty(&id).await
            }
        }
    }

    /// Capture a checkout, then bring the mirror back in line with the store.
    ///
    /// The line items are taken from the cart as it stands at this point in
    /// the queue, so every operation accepted earlier is part of the capture.
    /// Once the store has answered, the outcome is always returned; a failed
    /// follow-up cart request is only logged. `Err` means the capture was
    /// never sent.
    async fn capture(
        &self,
        token: CheckoutToken,
        details: CheckoutDetails,
    ) -> Result<CheckoutOutcome, SyncError> {
        self.publish(CartSnapshot::without_checkout_error);

        let captured_from = self.ensure_cart().await?;
        let cart_id = captured_from.id.clone();
        let payload = OrderPayload::for_cart(&captured_from, details);

        let outcome = match self.gateway.capture_checkout(&token, &payload).await {
            Ok(receipt) => {
                let order = Order::new(receipt, token, captured_from);
                info!(order_id = %order.id(), "Checkout captured");
                self.publish(|s| s.with_order(order.clone()));
                CheckoutOutcome::Captured(Box::new(order))
            }
            Err(e) => {
                let message = e.user_message();
                warn!(kind = ?e.kind(), error = %e, "Checkout capture failed");
                self.publish(|s| s.with_checkout_error(message.clone()));
                CheckoutOutcome::Failed {
                    message,
                    kind: e.kind(),
                }
            }
        };

        // A captured cart is finished, so start a new one; after a failure
        // the existing cart is re-read as the store may have changed it.
        let next = match outcome {
            CheckoutOutcome::Captured(_) => self.gateway.retrieve(None).await,
            CheckoutOutcome::Failed { .. } => self.gateway.refresh(&cart_id).await,
        };
        match next {
            Ok(cart) => {
                self.accept(cart);
            }
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "Cart refresh after checkout failed");
                if outcome.order().is_some() {
                    // Never mutate a captured cart; the next operation loads a new one.
                    self.publish(CartSnapshot::without_cart);
                }
            }
        }
        Ok(outcome)
    }
}
