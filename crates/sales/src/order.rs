use chrono::Utc;
use serde::{Deserialize, Serialize};

use shopfloor_core::{Aggregate, DomainError, DomainResult, OrderId, StoreId};
use shopfloor_inventory::{DebitStock, InventoryCommand, StockLine, Store};
use shopfloor_products::ProductKey;

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Confirmed,
}

/// Order line: product key and requested quantity (always > 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub key: ProductKey,
    pub quantity: i64,
}

impl OrderLine {
    /// `price × quantity` for this line, or `None` if it does not fit in `u64`.
    pub fn checked_subtotal(&self) -> Option<u64> {
        self.key.price().checked_mul(self.quantity.unsigned_abs())
    }

    /// `price × quantity` for this line.
    ///
    /// Saturates at `u64::MAX`; lines held by an [`Order`] always fit.
    pub fn subtotal(&self) -> u64 {
        self.checked_subtotal().unwrap_or(u64::MAX)
    }
}

/// A customer order against a single store.
///
/// The order never owns products: it keeps keys and quantities and checks
/// them against the store's live stock whenever it needs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    store_id: StoreId,
    status: OrderStatus,
    lines: Vec<OrderLine>,
}

impl Order {
    /// Create an empty draft order bound to `store_id`.
    pub fn new(store_id: StoreId) -> Self {
        Self {
            id: OrderId::new(),
            store_id,
            status: OrderStatus::Draft,
            lines: Vec::new(),
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, OrderStatus::Draft)
    }

    /// Quantity currently recorded for `key` (0 when absent).
    pub fn quantity_of(&self, key: &ProductKey) -> i64 {
        self.line(key).map_or(0, |line| line.quantity)
    }

    /// Add `quantity` units of `key`, checked against the store's live stock.
    ///
    /// The stock check looks at the store only, not at what this order
    /// already holds; `confirm` re-checks the accumulated quantities.
    pub fn add_product(
        &mut self,
        store: &Store,
        key: &ProductKey,
        quantity: i64,
    ) -> DomainResult<()> {
        self.ensure_modifiable()?;
        self.ensure_store(store)?;

        if quantity <= 0 {
            return Err(DomainError::invalid_argument("quantity must be positive"));
        }

        let product = store
            .product(key)
            .ok_or_else(|| DomainError::invalid_argument("product not available in store"))?;

        if !product.can_supply(quantity) {
            return Err(DomainError::insufficient_stock(
                product.name(),
                product.stock(),
                quantity,
            ));
        }

        let new_quantity = self
            .quantity_of(key)
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invalid_argument("order quantity overflows"))?;
        self.ensure_total_fits(key, new_quantity)?;

        match self.lines.iter_mut().find(|line| &line.key == key) {
            Some(line) => line.quantity = new_quantity,
            None => self.lines.push(OrderLine {
                key: key.clone(),
                quantity,
            }),
        }

        tracing::debug!(order_id = %self.id, product = %key, quantity, "line added");
        Ok(())
    }

    /// Remove `key` entirely (`quantity` of `None` or at least the recorded
    /// amount), or decrement it by `quantity`.
    pub fn remove_product(&mut self, key: &ProductKey, quantity: Option<i64>) -> DomainResult<()> {
        self.ensure_modifiable()?;

        if matches!(quantity, Some(q) if q <= 0) {
            return Err(DomainError::invalid_argument("quantity must be positive"));
        }

        let idx = self
            .lines
            .iter()
            .position(|line| &line.key == key)
            .ok_or_else(|| DomainError::not_found("product absent from order"))?;

        match quantity {
            Some(q) if q < self.lines[idx].quantity => {
                self.lines[idx].quantity -= q;
            }
            _ => {
                self.lines.remove(idx);
            }
        }

        tracing::debug!(order_id = %self.id, product = %key, ?quantity, "line removed");
        Ok(())
    }

    /// Sum of `price × quantity` over all lines; 0 for an empty order.
    pub fn calculate_total(&self) -> u64 {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    /// Confirm the order, debiting `store` for every line.
    ///
    /// All lines are validated against current stock first; if any is short,
    /// an `InsufficientStock` error is returned and no stock changes. A
    /// confirmed order cannot be confirmed again.
    pub fn confirm(&mut self, store: &mut Store) -> DomainResult<()> {
        if self.status == OrderStatus::Confirmed {
            return Err(DomainError::invalid_state("order is already confirmed"));
        }
        self.ensure_store(store)?;

        if self.lines.is_empty() {
            return Err(DomainError::invalid_state("cannot confirm an empty order"));
        }

        let command = InventoryCommand::DebitStock(DebitStock {
            lines: self
                .lines
                .iter()
                .map(|line| StockLine {
                    key: line.key.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            occurred_at: Utc::now(),
        });

        let events = store.handle(&command).inspect_err(|err| {
            tracing::warn!(order_id = %self.id, error = %err, "order confirmation rejected");
        })?;
        for event in &events {
            store.apply(event);
        }

        self.status = OrderStatus::Confirmed;
        tracing::info!(
            order_id = %self.id,
            total = self.calculate_total(),
            lines = self.lines.len(),
            "order confirmed"
        );
        Ok(())
    }

    fn line(&self, key: &ProductKey) -> Option<&OrderLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    /// The order total must stay representable once `key` holds `quantity`.
    fn ensure_total_fits(&self, key: &ProductKey, quantity: i64) -> DomainResult<()> {
        let candidate = OrderLine {
            key: key.clone(),
            quantity,
        };
        let total = candidate.checked_subtotal().and_then(|subtotal| {
            self.lines
                .iter()
                .filter(|line| &line.key != key)
                .try_fold(subtotal, |acc, line| acc.checked_add(line.checked_subtotal()?))
        });
        if total.is_none() {
            return Err(DomainError::invalid_argument("order total overflows"));
        }
        Ok(())
    }

    fn ensure_modifiable(&self) -> DomainResult<()> {
        if !self.is_modifiable() {
            return Err(DomainError::invalid_state(
                "cannot modify order once it is confirmed",
            ));
        }
        Ok(())
    }

    fn ensure_store(&self, store: &Store) -> DomainResult<()> {
        if store.id_typed() != self.store_id {
            return Err(DomainError::invalid_argument(
                "order belongs to a different store",
            ));
        }
        Ok(())
    }
}

/// Order factory for stores.
pub trait CreateOrder {
    /// Start an empty draft order bound to this store.
    fn create_order(&self) -> Order;
}

impl CreateOrder for Store {
    fn create_order(&self) -> Order {
        Order::new(self.id_typed())
    }
}
