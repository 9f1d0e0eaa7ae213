//! Integration tests for the order desk.
//!
//! These tests drive the cart, checkout and order lifecycle together over a
//! shared in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::ProductId;
use domain::{
    CartError, Catalog, DomainError, Money, OrderDesk, OrderError, OrderStatus,
};
use kv_store::{InMemoryStore, KeyValueStore, StoreError, keys};
use rust_decimal::Decimal;

async fn create_desk() -> (OrderDesk<InMemoryStore>, InMemoryStore) {
    let store = InMemoryStore::new();
    let desk = OrderDesk::load(store.clone(), Catalog::standard())
        .await
        .unwrap();
    (desk, store)
}

fn id(n: u32) -> ProductId {
    ProductId::new(n)
}

mod stock_consistency {
    use super::*;

    #[tokio::test]
    async fn add_item_decreases_stock_by_quantity() {
        let (desk, _) = create_desk().await;

        for (product, quantity) in [(1, 50), (4, 1), (9, 7)] {
            let before = desk.ledger.stock_of(id(product)).await;
            desk.cart.add_item(id(product), quantity).await.unwrap();
            assert_eq!(
                desk.ledger.stock_of(id(product)).await,
                before - quantity as u32
            );
        }
    }

    #[tokio::test]
    async fn add_then_remove_restores_stock() {
        let (desk, _) = create_desk().await;

        desk.cart.add_item(id(13), 12).await.unwrap();
        desk.cart.remove_item(id(13)).await.unwrap();

        assert_eq!(desk.ledger.stock_of(id(13)).await, 35);
    }

    #[tokio::test]
    async fn rejected_add_changes_nothing() {
        let (desk, _) = create_desk().await;

        let err = desk.cart.add_item(id(9), 21).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::Cart(CartError::InsufficientStock {
                requested: 21,
                available: 20,
                ..
            })
        ));
        assert_eq!(desk.ledger.stock_of(id(9)).await, 20);
        assert!(desk.cart.snapshot().await.items.is_empty());
    }

    #[tokio::test]
    async fn shortfall_reports_exactly_the_short_lines() {
        let (desk, _) = create_desk().await;
        desk.cart.add_item(id(1), 10).await.unwrap();
        desk.cart.add_item(id(2), 10).await.unwrap();
        desk.cart.add_item(id(3), 10).await.unwrap();

        // Drain product 2 below the cart's quantity.
        desk.ledger.reserve(id(2), 30).await.unwrap();

        let report = desk.cart.check_shortfall().await;
        let short: Vec<_> = report.shortages.iter().map(|s| s.product_id).collect();
        assert_eq!(short, vec![id(2)]);
        assert_eq!(report.shortages[0].requested, 10);
        assert_eq!(report.shortages[0].available, 5);
    }
}

mod checkout {
    use super::*;

    async fn fill_cart(desk: &OrderDesk<InMemoryStore>) {
        desk.vendors.login("Luis").await.unwrap();
        desk.cart.set_customer_name("Ana").await.unwrap();
        desk.cart.set_customer_address("Belgrano 123").await.unwrap();
        desk.cart.add_item(id(1), 2).await.unwrap();
        desk.cart.add_item(id(6), 3).await.unwrap();
    }

    #[tokio::test]
    async fn finalize_keeps_stock_and_clears_cart() {
        let (desk, _) = create_desk().await;
        fill_cart(&desk).await;
        let stock_before = desk.ledger.products().await;

        let order = desk.checkout(Decimal::ZERO, None).await.unwrap();

        assert_eq!(desk.ledger.products().await, stock_before);
        let cart = desk.cart.snapshot().await;
        assert!(cart.items.is_empty());
        assert_eq!(cart.customer_name, "");
        assert_eq!(cart.customer_address, "");

        assert_eq!(order.customer_address(), "Belgrano 123");
        assert_eq!(order.subtotal(), Money::from_units(13600));
    }

    #[tokio::test]
    async fn discount_bounds() {
        let (desk, _) = create_desk().await;

        fill_cart(&desk).await;
        let full = desk.checkout(Decimal::ZERO, None).await.unwrap();
        assert_eq!(full.final_total(), full.subtotal());

        fill_cart(&desk).await;
        let free = desk.checkout(Decimal::ONE_HUNDRED, None).await.unwrap();
        assert_eq!(free.final_total(), Money::zero());

        fill_cart(&desk).await;
        let err = desk.checkout(Decimal::from(101), None).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Order(OrderError::InvalidDiscount { .. })
        ));
        assert_eq!(desk.cart.snapshot().await.items.len(), 2);
    }

    #[tokio::test]
    async fn checkout_requires_login() {
        let (desk, _) = create_desk().await;
        fill_cart(&desk).await;
        desk.vendors.logout().await.unwrap();

        assert!(desk.checkout(Decimal::ZERO, None).await.is_err());
        assert_eq!(desk.cart.snapshot().await.items.len(), 2);
    }

    #[tokio::test]
    async fn delivering_twice_keeps_one_history_entry() {
        let (desk, _) = create_desk().await;
        fill_cart(&desk).await;
        let order = desk.checkout(Decimal::ZERO, None).await.unwrap();

        desk.orders
            .set_status(order.id(), OrderStatus::Delivered, None)
            .await
            .unwrap();
        desk.orders
            .set_status(order.id(), OrderStatus::Delivered, None)
            .await
            .unwrap();

        let history = desk.orders.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status(), OrderStatus::Delivered);
        assert!(desk.orders.pending().await.is_empty());
    }

    #[tokio::test]
    async fn cancelling_returns_reservation_to_stock() {
        let (desk, _) = create_desk().await;
        fill_cart(&desk).await;
        let order = desk.checkout(Decimal::ZERO, None).await.unwrap();
        assert_eq!(desk.ledger.stock_of(id(6)).await, 97);

        desk.orders.remove(order.id()).await.unwrap();

        assert_eq!(desk.ledger.stock_of(id(1)).await, 50);
        assert_eq!(desk.ledger.stock_of(id(6)).await, 100);
        assert_eq!(
            desk.orders.orders_by_status(OrderStatus::Cancelled).await.len(),
            1
        );
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn desk_state_survives_reload() {
        let (desk, store) = create_desk().await;
        desk.vendors.login("Luis").await.unwrap();
        desk.cart.set_customer_name("Ana").await.unwrap();
        desk.cart.add_item(id(4), 5).await.unwrap();
        let order = desk.checkout(Decimal::from(10), None).await.unwrap();
        desk.cart.add_item(id(2), 1).await.unwrap();

        let reloaded = OrderDesk::load(store, Catalog::standard()).await.unwrap();

        assert_eq!(reloaded.ledger.stock_of(id(4)).await, 20);
        assert_eq!(reloaded.ledger.stock_of(id(2)).await, 44);
        assert_eq!(reloaded.cart.snapshot().await.items.len(), 1);
        assert_eq!(reloaded.vendors.require().await.unwrap().name(), "Luis");
        assert_eq!(reloaded.orders.get(order.id()).await.unwrap(), order);
    }

    #[tokio::test]
    async fn legacy_spanish_blobs_load() {
        let store = InMemoryStore::new();
        store
            .set(
                keys::ORDER_HISTORY,
                r#"[{"id":"0b4ad1f5-54a4-4c1f-8a43-2c7e0f7f8e01","date":"2024-04-30T15:00:00.000Z",
                    "customerName":"Ana","customerAddress":"","vendorName":"Luis",
                    "items":[{"productId":2,"productName":"Almendras","price":4200,"quantity":1}],
                    "total":4200,"discount":0,"finalTotal":4200,"status":"pendiente"}]"#
                    .to_string(),
            )
            .await
            .unwrap();
        store
            .set(
                keys::PENDING_ORDERS,
                r#"[{"id":"0b4ad1f5-54a4-4c1f-8a43-2c7e0f7f8e01","date":"2024-04-30T15:00:00.000Z",
                    "customerName":"Ana","customerAddress":"","vendorName":"Luis",
                    "items":[{"productId":2,"productName":"Almendras","price":4200,"quantity":1}],
                    "total":4200,"discount":0,"finalTotal":4200,"status":"listo",
                    "notes":"tocar timbre"}]"#
                    .to_string(),
            )
            .await
            .unwrap();

        let desk = OrderDesk::load(store, Catalog::standard()).await.unwrap();

        let pending = desk.orders.pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status(), OrderStatus::Ready);
        assert_eq!(pending[0].notes(), Some("tocar timbre"));
        assert_eq!(desk.orders.history().await.len(), 1);
    }

    #[tokio::test]
    async fn open_history_entries_missing_from_pending_load_as_delivered() {
        let store = InMemoryStore::new();
        store
            .set(
                keys::ORDER_HISTORY,
                r#"[{"id":"6f1c2a9e-3b7d-4e52-9a18-0c4d5e6f7a80","date":"2024-04-29T12:00:00.000Z",
                    "customerName":"Eva","customerAddress":"","vendorName":"Marta",
                    "items":[{"productId":2,"productName":"Almendras","price":4200,"quantity":5}],
                    "total":21000,"discount":0,"finalTotal":21000,"status":"pendiente"}]"#
                    .to_string(),
            )
            .await
            .unwrap();
        store
            .set(keys::PENDING_ORDERS, "[]".to_string())
            .await
            .unwrap();

        let desk = OrderDesk::load(store, Catalog::standard()).await.unwrap();

        assert!(desk.orders.pending().await.is_empty());
        let history = desk.orders.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status(), OrderStatus::Delivered);

        let stock_before = desk.ledger.stock_of(id(2)).await;
        let removed = desk.orders.remove(history[0].id()).await.unwrap();
        assert_eq!(removed.status(), OrderStatus::Delivered);
        assert_eq!(desk.ledger.stock_of(id(2)).await, stock_before);
    }

    #[tokio::test]
    async fn malformed_blobs_fall_back_to_defaults() {
        let store = InMemoryStore::new();
        for key in [
            keys::CATALOG_STOCK,
            keys::CART_ITEMS,
            keys::ORDER_HISTORY,
            keys::PENDING_ORDERS,
            keys::VENDOR_SESSION,
        ] {
            store.set(key, "{broken".to_string()).await.unwrap();
        }

        let desk = OrderDesk::load(store, Catalog::standard()).await.unwrap();

        assert_eq!(desk.ledger.products().await, Catalog::standard().products());
        assert!(desk.cart.snapshot().await.items.is_empty());
        assert!(desk.orders.history().await.is_empty());
        assert!(desk.vendors.current().await.is_none());
    }
}

/// In-memory store whose writes to the order history can be made to fail.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: InMemoryStore,
    fail_history_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    fn fail_history_writes(&self, fail: bool) {
        self.fail_history_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> kv_store::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> kv_store::Result<()> {
        if key == keys::ORDER_HISTORY && self.fail_history_writes.load(Ordering::SeqCst) {
            let source = serde_json::from_str::<()>("unavailable").unwrap_err();
            return Err(StoreError::Serialization(source));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> kv_store::Result<()> {
        self.inner.remove(key).await
    }

    async fn keys(&self) -> kv_store::Result<Vec<String>> {
        self.inner.keys().await
    }
}

mod write_failures {
    use common::OrderId;

    use super::*;

    async fn desk_with_order() -> (OrderDesk<FlakyStore>, FlakyStore, OrderId) {
        let store = FlakyStore::default();
        let desk = OrderDesk::load(store.clone(), Catalog::standard())
            .await
            .unwrap();
        desk.vendors.login("Luis").await.unwrap();
        desk.cart.set_customer_name("Ana").await.unwrap();
        desk.cart.add_item(id(2), 5).await.unwrap();
        let order = desk.checkout(Decimal::ZERO, None).await.unwrap();
        (desk, store, order.id())
    }

    #[tokio::test]
    async fn failed_remove_keeps_order_open_and_stock_reserved() {
        let (desk, store, order_id) = desk_with_order().await;
        assert_eq!(desk.ledger.stock_of(id(2)).await, 40);

        store.fail_history_writes(true);
        let err = desk.orders.remove(order_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Store(_)));

        let order = desk.orders.get(order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(desk.ledger.stock_of(id(2)).await, 40);

        store.fail_history_writes(false);
        let cancelled = desk.orders.remove(order_id).await.unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert_eq!(desk.ledger.stock_of(id(2)).await, 45);
    }

    #[tokio::test]
    async fn failed_status_change_is_rolled_back() {
        let (desk, store, order_id) = desk_with_order().await;

        store.fail_history_writes(true);
        assert!(
            desk.orders
                .set_status(order_id, OrderStatus::Ready, Some("sin sal".to_string()))
                .await
                .is_err()
        );

        let order = desk.orders.get(order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.notes(), None);
        assert_eq!(desk.orders.pending().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_purge_keeps_order_in_history() {
        let (desk, store, order_id) = desk_with_order().await;
        desk.orders
            .set_status(order_id, OrderStatus::Delivered, None)
            .await
            .unwrap();

        store.fail_history_writes(true);
        assert!(desk.orders.purge(order_id).await.is_err());

        assert_eq!(desk.orders.history().await.len(), 1);
        store.fail_history_writes(false);
        desk.orders.purge(order_id).await.unwrap();
        assert!(desk.orders.history().await.is_empty());
    }
}
