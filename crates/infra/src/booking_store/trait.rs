use std::sync::Arc;

use thiserror::Error;

use renthub_booking::{Booking, BookingId};
use renthub_core::{ExpectedVersion, TenantId};

/// Booking store operation error.
///
/// Infrastructure errors (missing rows, stale versions, backend failures) as
/// opposed to negotiation errors raised by the aggregate itself.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("booking not found")]
    NotFound,

    #[error("optimistic concurrency check failed (expected {expected:?}, found {actual})")]
    VersionConflict {
        expected: ExpectedVersion,
        actual: u64,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Versioned snapshot store for bookings.
///
/// `save` persists the whole booking and succeeds only when the version
/// currently on record matches `expected_version` (a booking that was never
/// saved counts as version 0). Readers always see the last fully saved
/// snapshot, never a partial write.
pub trait BookingStore: Send + Sync {
    fn load(&self, booking_id: BookingId) -> Result<Booking, StoreError>;

    fn save(&self, booking: &Booking, expected_version: ExpectedVersion) -> Result<(), StoreError>;

    /// All bookings, in unspecified order. Administrator view.
    fn list_all(&self) -> Result<Vec<Booking>, StoreError>;

    /// Bookings belonging to one tenant. Tenant view.
    fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<Booking>, StoreError>;
}

impl<S> BookingStore for Arc<S>
where
    S: BookingStore + ?Sized,
{
    fn load(&self, booking_id: BookingId) -> Result<Booking, StoreError> {
        (**self).load(booking_id)
    }

    fn save(&self, booking: &Booking, expected_version: ExpectedVersion) -> Result<(), StoreError> {
        (**self).save(booking, expected_version)
    }

    fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
        (**self).list_all()
    }

    fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<Booking>, StoreError> {
        (**self).list_for_tenant(tenant_id)
    }
}
