//! Value object trait: equality by value, not identity.
//!
//! A discount (`percentage 10`) or a pair of sheet dimensions (`2.0 m × 1.5 m`)
//! has no identity of its own. Two of them with the same attributes are
//! interchangeable, and "changing" one means building a new one.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value, so the trait only asks
/// for `Clone + PartialEq + Debug`.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Dimensions { width_m: Decimal, height_m: Decimal }
///
/// impl ValueObject for Dimensions {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
