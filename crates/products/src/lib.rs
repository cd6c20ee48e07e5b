//! Products domain module.
//!
//! A product is identified by its name and price; its stock counter is a
//! mutable attribute that never takes part in identity.

pub mod product;

pub use product::{Product, ProductKey};
