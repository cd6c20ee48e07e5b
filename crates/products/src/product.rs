use core::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use shopfloor_core::{DomainError, DomainResult, Entity, ValueObject};

/// Product identity: name + unit price.
///
/// Price is in an abstract smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductKey {
    name: String,
    price: u64,
}

impl ProductKey {
    pub fn new(name: impl Into<String>, price: u64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }
}

impl ValueObject for ProductKey {}

impl core::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} @ {}", self.name, self.price)
    }
}

/// A stocked product.
///
/// Equality and hashing look at the [`ProductKey`] only, so the same product
/// with a different stock count is still the same product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    key: ProductKey,
    stock: i64,
}

impl Product {
    /// Create a product with an initial stock.
    ///
    /// Fails with `InvalidArgument` if `stock` is negative.
    pub fn new(name: impl Into<String>, price: u64, stock: i64) -> DomainResult<Self> {
        if stock < 0 {
            return Err(DomainError::invalid_argument("stock cannot be negative"));
        }
        Ok(Self {
            key: ProductKey::new(name, price),
            stock,
        })
    }

    pub fn key(&self) -> &ProductKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn price(&self) -> u64 {
        self.key.price()
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    /// Apply a signed stock delta (positive restocks, negative consumes).
    ///
    /// Either the whole delta is applied or, if the result would be negative,
    /// nothing changes and `InvalidArgument` is returned.
    pub fn update_stock(&mut self, delta: i64) -> DomainResult<()> {
        let new_stock = self
            .stock
            .checked_add(delta)
            .ok_or_else(|| DomainError::invalid_argument("stock update overflows"))?;
        if new_stock < 0 {
            return Err(DomainError::invalid_argument(format!(
                "stock cannot go negative (stock: {}, delta: {delta})",
                self.stock
            )));
        }
        self.stock = new_stock;
        Ok(())
    }

    /// Whether `quantity` units can be taken from current stock.
    pub fn can_supply(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

impl Entity for Product {
    type Id = ProductKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Product {}

impl Hash for Product {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
