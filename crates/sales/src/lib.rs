//! Sales orders domain module.
//!
//! An [`Order`] is a cart of product keys and quantities bound to one
//! [`Store`](shopfloor_inventory::Store). Confirming it debits the store's
//! stock for every line at once, or not at all.

pub mod order;

pub use order::{CreateOrder, Order, OrderLine, OrderStatus};
