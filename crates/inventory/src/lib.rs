//! Inventory domain module.
//!
//! The [`Store`] is the sole owner of product records and their stock. State
//! changes go through commands that are validated in full before any event is
//! applied.

pub mod listing;
pub mod store;

pub use listing::ProductListing;
pub use store::{
    AdjustStock, DebitStock, InventoryCommand, InventoryEvent, ProductRegistered,
    RegisterProduct, StockAdjusted, StockLine, StockMerged, Store,
};
