//! Domain error types.

use kv_store::StoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::order::OrderError;
use crate::vendor::VendorError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the key-value store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A cart operation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// An order operation was rejected.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A session operation was rejected.
    #[error("Vendor error: {0}")]
    Vendor(#[from] VendorError),
}
