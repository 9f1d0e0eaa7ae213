//! Shared identifiers and wire helpers used across the order desk crates.

pub mod timestamp;
pub mod types;

pub use types::{OrderId, ProductId};
