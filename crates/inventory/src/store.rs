use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{Aggregate, AggregateRoot, DomainError, DomainResult, StoreId};
use shopfloor_products::{Product, ProductKey};

use crate::listing::ProductListing;

/// Aggregate root: Store.
///
/// Holds the authoritative stock for every registered product, in
/// registration order. No two entries share a [`ProductKey`].
#[derive(Debug, Clone)]
pub struct Store {
    id: StoreId,
    products: Vec<Product>,
    history: Vec<InventoryEvent>,
    version: u64,
}

/// Requested quantity of one product, as consumed by [`DebitStock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub key: ProductKey,
    pub quantity: i64,
}

/// Command: RegisterProduct.
///
/// Adds a new product, or merges its stock into an equal one already present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterProduct {
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub key: ProductKey,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DebitStock.
///
/// Takes every line out of stock, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitStock {
    pub lines: Vec<StockLine>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InventoryCommand {
    RegisterProduct(RegisterProduct),
    AdjustStock(AdjustStock),
    DebitStock(DebitStock),
}

/// Event: ProductRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRegistered {
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockMerged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMerged {
    pub key: ProductKey,
    pub added: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub key: ProductKey,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ProductRegistered(ProductRegistered),
    StockMerged(StockMerged),
    StockAdjusted(StockAdjusted),
}

impl InventoryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ProductRegistered(_) => "inventory.product.registered",
            InventoryEvent::StockMerged(_) => "inventory.product.stock_merged",
            InventoryEvent::StockAdjusted(_) => "inventory.product.stock_adjusted",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ProductRegistered(e) => e.occurred_at,
            InventoryEvent::StockMerged(e) => e.occurred_at,
            InventoryEvent::StockAdjusted(e) => e.occurred_at,
        }
    }
}

impl Store {
    /// Create an empty store with a fresh identifier.
    pub fn new() -> Self {
        Self::with_id(StoreId::new())
    }

    pub fn with_id(id: StoreId) -> Self {
        Self {
            id,
            products: Vec::new(),
            history: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> StoreId {
        self.id
    }

    /// Registered products in registration order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, key: &ProductKey) -> Option<&Product> {
        self.products.iter().find(|p| p.key() == key)
    }

    pub fn contains(&self, key: &ProductKey) -> bool {
        self.product(key).is_some()
    }

    /// Current stock of `key`, if registered.
    pub fn stock_of(&self, key: &ProductKey) -> Option<i64> {
        self.product(key).map(Product::stock)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Every event applied to this store, oldest first.
    pub fn history(&self) -> &[InventoryEvent] {
        &self.history
    }

    pub fn list_products(&self) -> ProductListing<'_> {
        ProductListing::new(&self.products)
    }

    /// Register `product`, merging its stock into an equal product if one is
    /// already present.
    pub fn add_product(&mut self, product: Product) -> DomainResult<()> {
        self.execute(&InventoryCommand::RegisterProduct(RegisterProduct {
            product,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Restock (positive `delta`) or consume (negative `delta`) a registered
    /// product.
    pub fn update_stock(&mut self, key: &ProductKey, delta: i64) -> DomainResult<()> {
        self.execute(&InventoryCommand::AdjustStock(AdjustStock {
            key: key.clone(),
            delta,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    fn find_mut(&mut self, key: &ProductKey) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.key() == key)
    }

    fn require(&self, key: &ProductKey) -> DomainResult<&Product> {
        self.product(key).ok_or_else(|| {
            DomainError::invalid_argument(format!("product not available in store: {key}"))
        })
    }

    /// Returns whether the delta was applied. Events produced by `handle`
    /// against the current state always apply.
    fn shift_stock(&mut self, key: &ProductKey, delta: i64) -> bool {
        let Some(product) = self.find_mut(key) else {
            tracing::error!(product = %key, delta, "stock event for unregistered product");
            return false;
        };
        match product.update_stock(delta) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(product = %key, delta, error = %err, "stock event not applicable");
                false
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateRoot for Store {
    type Id = StoreId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Store {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    /// Inapplicable stock events (unknown product, negative result) are
    /// dropped: they reach neither the journal nor the version.
    fn apply(&mut self, event: &Self::Event) {
        let applied = match event {
            InventoryEvent::ProductRegistered(e) => {
                tracing::debug!(product = %e.product.key(), stock = e.product.stock(), "product registered");
                self.products.push(e.product.clone());
                true
            }
            InventoryEvent::StockMerged(e) => {
                tracing::debug!(product = %e.key, added = e.added, "stock merged");
                self.shift_stock(&e.key, e.added)
            }
            InventoryEvent::StockAdjusted(e) => {
                tracing::debug!(product = %e.key, delta = e.delta, "stock adjusted");
                self.shift_stock(&e.key, e.delta)
            }
        };
        if !applied {
            return;
        }

        self.history.push(event.clone());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::RegisterProduct(cmd) => self.handle_register(cmd),
            InventoryCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
            InventoryCommand::DebitStock(cmd) => self.handle_debit(cmd),
        }
    }
}

impl Store {
    fn handle_register(&self, cmd: &RegisterProduct) -> DomainResult<Vec<InventoryEvent>> {
        let incoming = &cmd.product;
        match self.product(incoming.key()) {
            Some(existing) => {
                if existing.stock().checked_add(incoming.stock()).is_none() {
                    return Err(DomainError::invalid_argument("merged stock overflows"));
                }
                Ok(vec![InventoryEvent::StockMerged(StockMerged {
                    key: incoming.key().clone(),
                    added: incoming.stock(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            None => Ok(vec![InventoryEvent::ProductRegistered(ProductRegistered {
                product: incoming.clone(),
                occurred_at: cmd.occurred_at,
            })]),
        }
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> DomainResult<Vec<InventoryEvent>> {
        let product = self
            .product(&cmd.key)
            .ok_or_else(|| DomainError::not_found(format!("product {} is not registered", cmd.key)))?;

        if cmd.delta == 0 {
            return Err(DomainError::invalid_argument("delta cannot be zero"));
        }

        // Dry run on a copy: same rules as the real update, no mutation.
        let mut probe = product.clone();
        probe.update_stock(cmd.delta)?;

        Ok(vec![InventoryEvent::StockAdjusted(StockAdjusted {
            key: cmd.key.clone(),
            delta: cmd.delta,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_debit(&self, cmd: &DebitStock) -> DomainResult<Vec<InventoryEvent>> {
        if cmd.lines.is_empty() {
            return Err(DomainError::invalid_argument("nothing to debit"));
        }

        for (idx, line) in cmd.lines.iter().enumerate() {
            if line.quantity <= 0 {
                return Err(DomainError::invalid_argument("quantity must be positive"));
            }
            let product = self.require(&line.key)?;

            // Lines for the same key draw on the same stock.
            let requested = cmd.lines[..=idx]
                .iter()
                .filter(|l| l.key == line.key)
                .try_fold(0i64, |acc, l| acc.checked_add(l.quantity))
                .ok_or_else(|| DomainError::invalid_argument("requested quantity overflows"))?;
            if !product.can_supply(requested) {
                return Err(DomainError::insufficient_stock(
                    product.name(),
                    product.stock(),
                    requested,
                ));
            }
        }

        Ok(cmd
            .lines
            .iter()
            .map(|line| {
                InventoryEvent::StockAdjusted(StockAdjusted {
                    key: line.key.clone(),
                    delta: -line.quantity,
                    occurred_at: cmd.occurred_at,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop_key() -> ProductKey {
        ProductKey::new("Ноутбук", 1000)
    }

    fn phone_key() -> ProductKey {
        ProductKey::new("Смартфон", 500)
    }

    fn stocked_store() -> Store {
        let mut store = Store::new();
        store
            .add_product(Product::new("Ноутбук", 1000, 5).unwrap())
            .unwrap();
        store
            .add_product(Product::new("Смартфон", 500, 10).unwrap())
            .unwrap();
        store
    }

    fn debit(lines: &[(ProductKey, i64)]) -> InventoryCommand {
        InventoryCommand::DebitStock(DebitStock {
            lines: lines
                .iter()
                .map(|(key, quantity)| StockLine {
                    key: key.clone(),
                    quantity: *quantity,
                })
                .collect(),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn new_store_is_empty() {
        let store = Store::new();
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
        assert!(store.list_products().is_empty());
    }

    #[test]
    fn add_product_appends_in_order() {
        let store = stocked_store();
        let names: Vec<_> = store.products().iter().map(Product::name).collect();
        assert_eq!(names, ["Ноутбук", "Смартфон"]);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn equal_product_merges_stock() {
        let mut store = Store::new();
        store.add_product(Product::new("X", 10, 3).unwrap()).unwrap();
        store.add_product(Product::new("X", 10, 4).unwrap()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.stock_of(&ProductKey::new("X", 10)), Some(7));
        assert_eq!(store.history()[1].event_type(), "inventory.product.stock_merged");
    }

    #[test]
    fn same_name_different_price_is_a_new_product() {
        let mut store = Store::new();
        store.add_product(Product::new("X", 10, 3).unwrap()).unwrap();
        store.add_product(Product::new("X", 11, 4).unwrap()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_stock_unknown_product_is_not_found() {
        let mut store = Store::new();
        let err = store.update_stock(&laptop_key(), 1).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn update_stock_rejects_negative_result() {
        let mut store = stocked_store();
        let err = store.update_stock(&laptop_key(), -6).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert_eq!(store.stock_of(&laptop_key()), Some(5));
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn update_stock_rejects_zero_delta() {
        let mut store = stocked_store();
        let err = store.update_stock(&laptop_key(), 0).unwrap_err();
        assert_eq!(err, DomainError::InvalidArgument("delta cannot be zero".into()));
    }

    #[test]
    fn update_stock_applies_delta() {
        let mut store = stocked_store();
        store.update_stock(&laptop_key(), 4).unwrap();
        store.update_stock(&phone_key(), -10).unwrap();
        assert_eq!(store.stock_of(&laptop_key()), Some(9));
        assert_eq!(store.stock_of(&phone_key()), Some(0));
    }

    #[test]
    fn debit_emits_one_event_per_line() {
        let store = stocked_store();
        let events = store
            .handle(&debit(&[(laptop_key(), 2), (phone_key(), 3)]))
            .unwrap();
        assert_eq!(events.len(), 2);
        match &events[0] {
            InventoryEvent::StockAdjusted(e) => {
                assert_eq!(e.key, laptop_key());
                assert_eq!(e.delta, -2);
            }
            _ => panic!("Expected StockAdjusted event"),
        }
    }

    #[test]
    fn debit_is_all_or_nothing() {
        let mut store = stocked_store();
        let err = store
            .execute(&debit(&[(phone_key(), 3), (laptop_key(), 6)]))
            .unwrap_err();

        assert_eq!(err, DomainError::insufficient_stock("Ноутбук", 5, 6));
        assert_eq!(store.stock_of(&phone_key()), Some(10));
        assert_eq!(store.stock_of(&laptop_key()), Some(5));
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn debit_counts_repeated_keys_together() {
        let store = stocked_store();
        let err = store
            .handle(&debit(&[(laptop_key(), 3), (laptop_key(), 3)]))
            .unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock("Ноутбук", 5, 6));
    }

    #[test]
    fn debit_rejects_requested_quantity_overflow() {
        let mut store = Store::new();
        store
            .add_product(Product::new("Bolt", 1, i64::MAX).unwrap())
            .unwrap();
        let bolt = ProductKey::new("Bolt", 1);

        let err = store
            .execute(&debit(&[(bolt.clone(), i64::MAX), (bolt.clone(), 1)]))
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::InvalidArgument("requested quantity overflows".into())
        );
        assert_eq!(store.stock_of(&bolt), Some(i64::MAX));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn inapplicable_stock_event_is_not_journaled() {
        let mut store = stocked_store();
        let overdraw = InventoryEvent::StockAdjusted(StockAdjusted {
            key: laptop_key(),
            delta: -100,
            occurred_at: Utc::now(),
        });
        let unknown = InventoryEvent::StockMerged(StockMerged {
            key: ProductKey::new("Планшет", 700),
            added: 1,
            occurred_at: Utc::now(),
        });

        store.apply(&overdraw);
        store.apply(&unknown);

        assert_eq!(store.stock_of(&laptop_key()), Some(5));
        assert_eq!(store.version(), 2);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn debit_unknown_product_is_invalid_argument() {
        let store = stocked_store();
        let err = store
            .handle(&debit(&[(ProductKey::new("Планшет", 700), 1)]))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(m) if m.contains("not available")));
    }

    #[test]
    fn debit_rejects_empty_and_non_positive_lines() {
        let store = stocked_store();
        assert!(store.handle(&debit(&[])).is_err());
        assert!(store.handle(&debit(&[(laptop_key(), 0)])).is_err());
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let store = stocked_store();
        let before: Vec<_> = store.products().iter().map(Product::stock).collect();
        let _ = store.handle(&debit(&[(laptop_key(), 5)])).unwrap();
        let after: Vec<_> = store.products().iter().map(Product::stock).collect();
        assert_eq!(before, after);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn history_serializes_with_event_names() {
        let store = stocked_store();
        let json = serde_json::to_value(store.history()).unwrap();
        let first = &json[0]["ProductRegistered"]["product"];
        assert_eq!(first["key"]["name"], "Ноутбук");
        assert_eq!(first["stock"], 5);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: re-registering an equal product adds exactly its stock
            /// and never adds an entry.
            #[test]
            fn merge_law(first in 0i64..1_000, second in 0i64..1_000) {
                let mut store = Store::new();
                store.add_product(Product::new("X", 10, first).unwrap()).unwrap();
                store.add_product(Product::new("X", 10, second).unwrap()).unwrap();
                prop_assert_eq!(store.len(), 1);
                prop_assert_eq!(store.stock_of(&ProductKey::new("X", 10)), Some(first + second));
            }

            /// Property: a debit either applies in full or leaves every stock
            /// count unchanged.
            #[test]
            fn debit_all_or_nothing(
                stocks in proptest::collection::vec(0i64..20, 1..6),
                wants in proptest::collection::vec(1i64..25, 1..6)
            ) {
                let mut store = Store::new();
                for (i, stock) in stocks.iter().enumerate() {
                    store.add_product(Product::new(format!("p{i}"), 1, *stock).unwrap()).unwrap();
                }
                let lines: Vec<_> = wants
                    .iter()
                    .enumerate()
                    .map(|(i, q)| (ProductKey::new(format!("p{}", i % stocks.len()), 1), *q))
                    .collect();

                let before: Vec<_> = store.products().iter().map(Product::stock).collect();
                let result = store.execute(&debit(&lines));
                let after: Vec<_> = store.products().iter().map(Product::stock).collect();

                match result {
                    Ok(_) => {
                        for (i, stock) in after.iter().enumerate() {
                            let taken: i64 = lines
                                .iter()
                                .filter(|(k, _)| k.name() == format!("p{i}"))
                                .map(|(_, q)| q)
                                .sum();
                            prop_assert_eq!(*stock, before[i] - taken);
                        }
                    }
                    Err(_) => prop_assert_eq!(before, after),
                }
                prop_assert!(store.products().iter().all(|p| p.stock() >= 0));
            }
        }
    }
}
