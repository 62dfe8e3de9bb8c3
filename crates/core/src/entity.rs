//! Entity trait: identity that survives edits to the owning aggregate.
//!
//! Payments are the main example: an invoice's item list can be replaced
//! wholesale, but each payment recorded against it keeps its own identity.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
