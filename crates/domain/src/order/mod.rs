//! Finalized orders, their status lifecycle, and checkout.

mod aggregate;
mod book;
mod service;
mod state;

pub use aggregate::{Order, OrderBuilder, OrderLine, Receipt, ReceiptDiscount, ReceiptLine};
pub use book::OrderBook;
pub use service::OrderService;
pub use state::OrderStatus;

use common::OrderId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Discount outside 0..=100.
    #[error("Invalid discount: {percent} (must be between 0 and 100)")]
    InvalidDiscount { percent: Decimal },

    /// No order with this id.
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// Order is not in a status that allows the change.
    #[error("Invalid state transition: cannot move from {current} to {requested}")]
    InvalidStateTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// Only delivered or cancelled orders can be deleted from history.
    #[error("Order {order_id} is still {status}")]
    OrderStillOpen {
        order_id: OrderId,
        status: OrderStatus,
    },
}
