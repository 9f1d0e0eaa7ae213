//! The active cart and its service.

mod aggregate;
mod service;

pub use aggregate::{Cart, CartLine, CartSnapshot};
pub use service::CartService;

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantity must be a positive integer.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// Product is not in the catalog.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Not enough stock to cover the request.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Checkout needs at least one line.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout needs a customer name.
    #[error("Customer name is required")]
    CustomerNameRequired,
}
