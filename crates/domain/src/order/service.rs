//! Order service: checkout and the pending-order lifecycle.

use std::sync::Arc;

use chrono::Utc;
use common::OrderId;
use kv_store::{KeyValueStore, KeyValueStoreExt, keys};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{Order, OrderBook, OrderError, OrderStatus, Receipt};
use crate::cart::CartService;
use crate::error::DomainError;
use crate::ledger::{ShortfallReport, StockLedger};
use crate::value_objects::DiscountPercent;
use crate::vendor::{VendorError, VendorSession};

/// Service for finalized orders.
///
/// Owns the order book and writes both the history and pending blobs after
/// every change. Stock reserved by a cart passes to its order at checkout and
/// goes back to the ledger if the order is cancelled.
pub struct OrderService<S: KeyValueStore> {
    store: S,
    ledger: StockLedger<S>,
    book: Arc<RwLock<OrderBook>>,
}

impl<S: KeyValueStore + Clone> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ledger: self.ledger.clone(),
            book: Arc::clone(&self.book),
        }
    }
}

impl<S: KeyValueStore + Clone> OrderService<S> {
    /// Creates a service over an empty order book.
    pub fn new(store: S, ledger: StockLedger<S>) -> Self {
        Self {
            store,
            ledger,
            book: Arc::new(RwLock::new(OrderBook::new())),
        }
    }

    /// Creates a service and restores the persisted order book.
    #[tracing::instrument(skip_all)]
    pub async fn load(store: S, ledger: StockLedger<S>) -> Result<Self, DomainError> {
        let history: Vec<Order> = store
            .load_json(keys::ORDER_HISTORY)
            .await?
            .unwrap_or_default();
        let pending: Option<Vec<Order>> = store.load_json(keys::PENDING_ORDERS).await?;

        let book = OrderBook::from_persisted(history, pending);
        tracing::info!(orders = book.len(), "restored order book");

        Ok(Self {
            store,
            ledger,
            book: Arc::new(RwLock::new(book)),
        })
    }

    /// Turns the cart into a pending order.
    ///
    /// Nothing is written unless every precondition holds. On success the
    /// cart lines are dropped without releasing stock and the customer fields
    /// are cleared.
    #[tracing::instrument(skip(self, cart))]
    pub async fn finalize(
        &self,
        cart: &CartService<S>,
        vendor: Option<&VendorSession>,
        discount_percent: Decimal,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        let discount = DiscountPercent::new(discount_percent).ok_or(OrderError::InvalidDiscount {
            percent: discount_percent,
        })?;
        let vendor = vendor.ok_or(VendorError::NotLoggedIn)?;

        let mut pending_cart = cart.lock().await;
        let order = Order::checkout(
            pending_cart.lines(),
            pending_cart.customer_name(),
            pending_cart.customer_address(),
            vendor.name(),
            discount,
            notes,
            Utc::now(),
        )?;

        {
            let mut book = self.book.write().await;
            book.insert_front(order.clone());
            if let Err(e) = self.persist(&book).await {
                book.purge(order.id());
                return Err(e);
            }
        }

        pending_cart.take_lines();
        pending_cart.clear_customer();
        cart.persist(&pending_cart).await?;

        metrics::counter!("orders_finalized_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            total = %order.final_total(),
            vendor = vendor.name(),
            "order finalized"
        );

        Ok(order)
    }

    /// Moves an order along its lifecycle, replacing notes when given.
    ///
    /// Delivering an already delivered order is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        let mut book = self.book.write().await;
        let order = book
            .get_mut(order_id)
            .ok_or(OrderError::OrderNotFound { order_id })?;

        let current = order.status();
        if status == OrderStatus::Cancelled {
            return Err(OrderError::InvalidStateTransition {
                current,
                requested: status,
            }
            .into());
        }
        if current == OrderStatus::Delivered && status == OrderStatus::Delivered {
            return Ok(order.clone());
        }

        let previous = order.clone();
        order.transition(status, notes)?;
        let updated = order.clone();
        if let Err(e) = self.persist(&book).await {
            book.restore(previous);
            return Err(e);
        }

        metrics::counter!("order_status_changes_total", "status" => status.as_str()).increment(1);
        tracing::info!(%order_id, from = %current, to = %status, "order status changed");

        Ok(updated)
    }

    /// Cancels an open order and releases its stock.
    ///
    /// Removing a delivered or cancelled order changes nothing. If the order
    /// book cannot be written the order stays open and keeps its stock.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let mut book = self.book.write().await;
        let order = book
            .get_mut(order_id)
            .ok_or(OrderError::OrderNotFound { order_id })?;

        if !order.is_open() {
            return Ok(order.clone());
        }

        let previous = order.clone();
        order.transition(OrderStatus::Cancelled, None)?;
        let cancelled = order.clone();
        if let Err(e) = self.persist(&book).await {
            book.restore(previous);
            return Err(e);
        }

        self.ledger
            .release_all(cancelled.lines().iter().map(|l| (l.product_id, l.quantity)))
            .await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled, stock released");

        Ok(cancelled)
    }

    /// Deletes a delivered or cancelled order from history.
    #[tracing::instrument(skip(self))]
    pub async fn purge(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let mut book = self.book.write().await;
        let order = book
            .get(order_id)
            .ok_or(OrderError::OrderNotFound { order_id })?;

        if order.is_open() {
            return Err(OrderError::OrderStillOpen {
                order_id,
                status: order.status(),
            }
            .into());
        }

        let purged = book
            .purge(order_id)
            .ok_or(OrderError::OrderNotFound { order_id })?;
        if let Err(e) = self.persist(&book).await {
            book.restore(purged);
            return Err(e);
        }

        tracing::info!(%order_id, "order purged from history");
        Ok(purged)
    }

    /// Loads an order by id.
    pub async fn get(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.book
            .read()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| OrderError::OrderNotFound { order_id }.into())
    }

    /// Every order, most recent first.
    pub async fn history(&self) -> Vec<Order> {
        self.book.read().await.history().to_vec()
    }

    /// Open orders, most recent first.
    pub async fn pending(&self) -> Vec<Order> {
        self.book.read().await.pending().cloned().collect()
    }

    /// Orders in a given status, most recent first.
    pub async fn orders_by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.book
            .read()
            .await
            .orders_by_status(status)
            .cloned()
            .collect()
    }

    /// History entries matching a customer or product name.
    pub async fn search_history(&self, term: &str) -> Vec<Order> {
        self.book
            .read()
            .await
            .history()
            .iter()
            .filter(|o| o.matches(term))
            .cloned()
            .collect()
    }

    /// Open orders matching a customer or product name.
    pub async fn search_pending(&self, term: &str) -> Vec<Order> {
        self.book
            .read()
            .await
            .pending()
            .filter(|o| o.matches(term))
            .cloned()
            .collect()
    }

    /// Reports order lines whose quantity exceeds current stock.
    pub async fn check_shortfall(&self, order_id: OrderId) -> Result<ShortfallReport, DomainError> {
        let order = self.get(order_id).await?;
        Ok(self
            .ledger
            .shortfall(
                order
                    .lines()
                    .iter()
                    .map(|l| (l.product_id, l.product_name.as_str(), l.quantity)),
            )
            .await)
    }

    /// Builds the receipt for an order.
    pub async fn receipt(&self, order_id: OrderId) -> Result<Receipt, DomainError> {
        Ok(self.get(order_id).await?.receipt())
    }

    async fn persist(&self, book: &OrderBook) -> Result<(), DomainError> {
        self.store
            .set_json(keys::ORDER_HISTORY, book.history())
            .await?;
        let pending: Vec<&Order> = book.pending().collect();
        self.store.set_json(keys::PENDING_ORDERS, &pending).await?;
        Ok(())
    }
}
