//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Inventory blocks are entities: they are mutated in place (consumed counters) but stay
/// the same block for as long as their owning contract exists.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
