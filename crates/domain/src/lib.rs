//! Domain layer for the order desk.
//!
//! This crate provides:
//! - The fixed product catalog and the stock ledger that owns stock levels
//! - The cart aggregate and its service
//! - Finalized orders with their status state machine and order book
//! - The vendor session

pub mod cart;
pub mod catalog;
pub mod desk;
pub mod error;
pub mod ledger;
pub mod order;
pub mod value_objects;
pub mod vendor;

pub use cart::{Cart, CartError, CartLine, CartService, CartSnapshot};
pub use catalog::{Catalog, Category, LOW_STOCK_THRESHOLD, Product};
pub use desk::OrderDesk;
pub use error::DomainError;
pub use ledger::{Shortage, ShortfallReport, StockLedger};
pub use order::{
    Order, OrderBook, OrderBuilder, OrderError, OrderLine, OrderService, OrderStatus, Receipt,
    ReceiptDiscount, ReceiptLine,
};
pub use value_objects::{DiscountPercent, Money};
pub use vendor::{VendorError, VendorService, VendorSession};
