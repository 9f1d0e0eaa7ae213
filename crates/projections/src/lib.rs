//! Sales statistics over the order history.
//!
//! This crate provides the reporting side of the order desk:
//! - [`TimeFilter`] for calendar reporting windows in a caller's time zone
//! - [`compute_stats`] rolling history up into totals, products and vendors
//! - [`products_csv`] exporting the product rollup

pub mod error;
pub mod export;
pub mod period;
pub mod stats;

pub use error::{ProjectionError, Result};
pub use export::{products_csv, products_csv_filename};
pub use period::TimeFilter;
pub use stats::{ProductStat, Stats, VendorStat, compute_stats};
