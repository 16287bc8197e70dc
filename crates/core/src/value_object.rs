//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and defined entirely by their attribute
/// values; two with the same values are interchangeable. Entities, by
/// contrast, carry identity (see [`crate::Entity`]).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
