//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// An entity keeps its identity while its mutable attributes (e.g. stock
/// counts) change; equality of entities should follow `id()` alone.
pub trait Entity {
    /// Identifier type. Must be usable as a map key.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
