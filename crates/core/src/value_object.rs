//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one, build a
/// new one. `DateRange` and `AvailabilityRequest` are the value objects of this domain:
/// two requests for the same nights and quantity are interchangeable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
