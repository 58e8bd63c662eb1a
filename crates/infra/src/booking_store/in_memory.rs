use std::collections::HashMap;
use std::sync::RwLock;

use renthub_booking::{Booking, BookingId};
use renthub_core::{AggregateRoot, ExpectedVersion, TenantId};

use super::r#trait::{BookingStore, StoreError};

/// In-memory booking store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<BookingId, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingStore for InMemoryBookingStore {
    fn load(&self, booking_id: BookingId) -> Result<Booking, StoreError> {
        let bookings = self
            .bookings
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        bookings.get(&booking_id).cloned().ok_or(StoreError::NotFound)
    }

    fn save(&self, booking: &Booking, expected_version: ExpectedVersion) -> Result<(), StoreError> {
        let mut bookings = self
            .bookings
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        // A booking that was never saved is at version 0.
        let current = bookings
            .get(&booking.id_typed())
            .map(|b| b.version())
            .unwrap_or(0);
        if !expected_version.matches(current) {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: current,
            });
        }

        bookings.insert(booking.id_typed(), booking.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = self
            .bookings
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(bookings.values().cloned().collect())
    }

    fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<Booking>, StoreError> {
        let bookings = self
            .bookings
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(bookings
            .values()
            .filter(|b| b.tenant_id() == Some(tenant_id))
            .cloned()
            .collect())
    }
}
