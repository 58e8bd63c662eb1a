//! Versioned booking persistence boundary.
//!
//! Bookings are stored as whole snapshots guarded by an optimistic version
//! check, so two concurrent writers cannot silently overwrite each other.
//! The trait makes no storage assumptions; the in-memory backend serves
//! tests and development.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryBookingStore;
pub use r#trait::{BookingStore, StoreError};
