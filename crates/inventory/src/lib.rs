//! Catalog stock availability.
//!
//! The catalog itself is owned elsewhere; this crate only answers "is there
//! enough stock for these items" against a point-in-time snapshot.

pub mod stock;

pub use stock::{ProductId, StockCatalog, StockLevel, StockSnapshot, check_availability};
