//! Key-value persistence for the order desk.
//!
//! Every piece of durable state (catalog stock, cart, vendor session, orders)
//! lives under its own key as an opaque blob, usually JSON. This crate provides:
//! - [`KeyValueStore`] trait with an in-memory and a PostgreSQL backend
//! - [`KeyValueStoreExt`] JSON helpers, including the lenient loader that
//!   treats malformed blobs as absent
//! - [`keys`] with the names every blob is stored under

pub mod error;
pub mod keys;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{KeyValueStore, KeyValueStoreExt};
