//! Wiring of the desk services over one store.

use kv_store::KeyValueStore;
use rust_decimal::Decimal;

use crate::cart::CartService;
use crate::catalog::Catalog;
use crate::error::DomainError;
use crate::ledger::StockLedger;
use crate::order::{Order, OrderService};
use crate::vendor::VendorService;

/// All services of one order desk, sharing a store and a stock ledger.
pub struct OrderDesk<S: KeyValueStore> {
    pub ledger: StockLedger<S>,
    pub cart: CartService<S>,
    pub orders: OrderService<S>,
    pub vendors: VendorService<S>,
}

impl<S: KeyValueStore + Clone> Clone for OrderDesk<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            cart: self.cart.clone(),
            orders: self.orders.clone(),
            vendors: self.vendors.clone(),
        }
    }
}

impl<S: KeyValueStore + Clone> OrderDesk<S> {
    /// Restores every service from `store`, starting from `catalog`.
    #[tracing::instrument(skip_all)]
    pub async fn load(store: S, catalog: Catalog) -> Result<Self, DomainError> {
        let ledger = StockLedger::load(store.clone(), catalog).await?;
        let cart = CartService::load(store.clone(), ledger.clone()).await?;
        let orders = OrderService::load(store.clone(), ledger.clone()).await?;
        let vendors = VendorService::load(store).await?;

        Ok(Self {
            ledger,
            cart,
            orders,
            vendors,
        })
    }

    /// Finalizes the cart for the logged-in vendor.
    pub async fn checkout(
        &self,
        discount_percent: Decimal,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        let vendor = self.vendors.current().await;
        self.orders
            .finalize(&self.cart, vendor.as_ref(), discount_percent, notes)
            .await
    }
}
