//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity of their own: two instances with the same
/// attribute values are the same value. They are immutable once built; to
/// "change" one, construct a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// struct ProductKey {
///     name: String,
///     price: u64,
/// }
///
/// impl ValueObject for ProductKey {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
