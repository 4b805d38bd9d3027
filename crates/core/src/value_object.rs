//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A promotion is the
/// canonical example here: two "30% off" promotions with the same name and rate
/// are interchangeable, and attaching the same one to several products shares
/// nothing but its value.
///
/// The trait requires:
/// - **Clone**: value objects are cheap to copy around
/// - **PartialEq**: compared by their attribute values
/// - **Debug**: helpful for logging and testing
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
