//! Route handlers, one module per resource.

pub mod cart;
pub mod orders;
pub mod products;
pub mod session;
pub mod stats;
pub mod system;
