//! Cart service: applies cart changes against the stock ledger and persists them.

use std::sync::Arc;

use common::ProductId;
use kv_store::{KeyValueStore, KeyValueStoreExt, keys};
use tokio::sync::{Mutex, MutexGuard};

use super::{Cart, CartError, CartLine, CartSnapshot};
use crate::error::DomainError;
use crate::ledger::{ShortfallReport, StockLedger};
use crate::value_objects::Money;

/// Service for the active cart.
///
/// Every mutation runs under one lock, so checking stock and reserving it
/// happen atomically with respect to other cart requests.
pub struct CartService<S: KeyValueStore> {
    store: S,
    ledger: StockLedger<S>,
    cart: Arc<Mutex<Cart>>,
}

impl<S: KeyValueStore + Clone> Clone for CartService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ledger: self.ledger.clone(),
            cart: Arc::clone(&self.cart),
        }
    }
}

impl<S: KeyValueStore + Clone> CartService<S> {
    /// Creates a service over an empty cart.
    pub fn new(store: S, ledger: StockLedger<S>) -> Self {
        Self {
            store,
            ledger,
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Creates a service and restores the persisted cart and customer fields.
    #[tracing::instrument(skip_all)]
    pub async fn load(store: S, ledger: StockLedger<S>) -> Result<Self, DomainError> {
        let lines: Vec<CartLine> = store
            .load_json(keys::CART_ITEMS)
            .await?
            .unwrap_or_default();
        let customer_name = store.get(keys::CUSTOMER_NAME).await?.unwrap_or_default();
        let customer_address = store
            .get(keys::CUSTOMER_ADDRESS)
            .await?
            .unwrap_or_default();

        let cart = Cart::from_parts(lines, customer_name, customer_address);
        tracing::info!(lines = cart.lines().len(), "restored cart");

        Ok(Self {
            store,
            ledger,
            cart: Arc::new(Mutex::new(cart)),
        })
    }

    /// Returns the stock ledger this cart reserves against.
    pub fn ledger(&self) -> &StockLedger<S> {
        &self.ledger
    }

    /// Returns a view of the cart.
    pub async fn snapshot(&self) -> CartSnapshot {
        self.cart.lock().await.snapshot()
    }

    /// Returns the cart total.
    pub async fn total(&self) -> Money {
        self.cart.lock().await.total()
    }

    /// Adds `quantity` units of a product, reserving them from stock.
    ///
    /// Rejects the whole request when stock cannot cover it; there is no
    /// partial fill. Units already in the cart were taken out of stock when
    /// they were added, so only the new `quantity` is checked against it.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartSnapshot, DomainError> {
        let quantity = Cart::validate_quantity(quantity)?;
        let mut cart = self.cart.lock().await;

        let product = self
            .ledger
            .product(product_id)
            .await
            .ok_or(CartError::ProductNotFound { product_id })?;

        // Stock is already net of this cart's own reservation for the product.
        if quantity > product.stock {
            return Err(CartError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            }
            .into());
        }

        self.ledger.reserve(product_id, quantity).await?;
        cart.add(product, quantity);
        self.persist_lines(&cart).await?;

        metrics::counter!("cart_items_added_total").increment(1);
        tracing::info!(%product_id, quantity, "item added to cart");

        Ok(cart.snapshot())
    }

    /// Removes a product's line and releases its stock. No-op if absent.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<CartSnapshot, DomainError> {
        let mut cart = self.cart.lock().await;

        if let Some(line) = cart.remove(product_id) {
            self.ledger.release(product_id, line.quantity).await?;
            self.persist_lines(&cart).await?;
            tracing::info!(%product_id, quantity = line.quantity, "item removed from cart");
        }

        Ok(cart.snapshot())
    }

    /// Empties the cart, releasing all reserved stock and the customer fields.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), DomainError> {
        let mut cart = self.cart.lock().await;

        let lines = cart.take_lines();
        self.ledger
            .release_all(lines.iter().map(|l| (l.product_id(), l.quantity)))
            .await?;
        cart.clear_customer();
        self.persist(&cart).await?;

        tracing::info!(released = lines.len(), "cart cleared");
        Ok(())
    }

    /// Reports lines whose quantity exceeds current stock.
    pub async fn check_shortfall(&self) -> ShortfallReport {
        let cart = self.cart.lock().await;
        self.ledger
            .shortfall(
                cart.lines()
                    .iter()
                    .map(|l| (l.product_id(), l.product.name.as_str(), l.quantity)),
            )
            .await
    }

    /// Sets and persists the customer name.
    #[tracing::instrument(skip(self))]
    pub async fn set_customer_name(&self, name: &str) -> Result<(), DomainError> {
        let mut cart = self.cart.lock().await;
        cart.set_customer_name(name);
        self.store.set(keys::CUSTOMER_NAME, name.to_string()).await?;
        Ok(())
    }

    /// Sets and persists the customer address.
    #[tracing::instrument(skip(self))]
    pub async fn set_customer_address(&self, address: &str) -> Result<(), DomainError> {
        let mut cart = self.cart.lock().await;
        cart.set_customer_address(address);
        self.store
            .set(keys::CUSTOMER_ADDRESS, address.to_string())
            .await?;
        Ok(())
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().await
    }

    pub(crate) async fn persist(&self, cart: &Cart) -> Result<(), DomainError> {
        self.persist_lines(cart).await?;
        self.store
            .set(keys::CUSTOMER_NAME, cart.customer_name().to_string())
            .await?;
        self.store
            .set(keys::CUSTOMER_ADDRESS, cart.customer_address().to_string())
            .await?;
        Ok(())
    }

    async fn persist_lines(&self, cart: &Cart) -> Result<(), DomainError> {
        self.store.set_json(keys::CART_ITEMS, cart.lines()).await?;
        Ok(())
    }
}
