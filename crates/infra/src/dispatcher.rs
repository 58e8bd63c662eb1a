//! Command execution pipeline.
//!
//! The dispatcher runs one booking command end to end: load the booking (or
//! start an empty one for creation), let the aggregate decide, fold the
//! decided events into the new state, and save it back under an optimistic
//! version check. A stale save means another writer won the race; the
//! dispatcher reloads and re-runs the command a bounded number of times, so
//! callers only ever observe commands evaluated against current state.

use thiserror::Error;
use tracing::{debug, warn};

use renthub_booking::{Booking, BookingCommand, NegotiationError};
use renthub_core::{Aggregate, AggregateRoot, ExpectedVersion};
use renthub_events::Event;

use crate::booking_store::{BookingStore, StoreError};

/// Save attempts per command before giving up on version contention.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The aggregate refused the command.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// The store failed for a reason other than version contention.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every save attempt lost the version race.
    #[error("booking contended after {attempts} attempts")]
    Contention { attempts: u32 },
}

/// Runs booking commands against a [`BookingStore`].
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
    max_attempts: u32,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(store: S, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> CommandDispatcher<S>
where
    S: BookingStore,
{
    /// Execute a command and return the booking as saved.
    ///
    /// A command for an unknown booking id starts from an empty booking, so
    /// creation and the aggregate's own not-found check both flow through the
    /// same path. Version conflicts on save are retried against freshly
    /// loaded state; any aggregate rejection is surfaced as-is.
    pub fn dispatch(&self, command: &BookingCommand) -> Result<Booking, DispatchError> {
        let booking_id = command.booking_id();

        for attempt in 1..=self.max_attempts {
            let mut booking = match self.store.load(booking_id) {
                Ok(existing) => existing,
                Err(StoreError::NotFound) => Booking::empty(booking_id),
                Err(e) => return Err(DispatchError::Store(e)),
            };
            let expected = ExpectedVersion::Exact(booking.version());

            let events = booking.handle(command)?;
            for event in &events {
                debug!(%booking_id, event_type = event.event_type(), "applying booking event");
                booking.apply(event);
            }

            match self.store.save(&booking, expected) {
                Ok(()) => {
                    debug!(
                        %booking_id,
                        status = %booking.status(),
                        version = booking.version(),
                        "booking saved"
                    );
                    return Ok(booking);
                }
                Err(StoreError::VersionConflict { actual, .. }) => {
                    warn!(%booking_id, attempt, actual, "version conflict, reloading");
                }
                Err(e) => return Err(DispatchError::Store(e)),
            }
        }

        Err(DispatchError::Contention {
            attempts: self.max_attempts,
        })
    }
}
