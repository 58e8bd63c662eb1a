//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**; they have no
/// identity of their own. A `TimeSlot` of `"08:00-09:00"` is the same slot
/// wherever it appears; a `Booking`, by contrast, is an entity identified by
/// its id regardless of field values.
///
/// To "modify" a value object, construct a new one. The trait bounds keep
/// value objects cheap to copy, comparable, and debuggable:
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Terms {
///     date: CalendarDate,
///     slot: TimeSlot,
/// }
///
/// impl ValueObject for Terms {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
