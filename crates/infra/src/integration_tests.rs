//! Integration tests for the dispatch pipeline.
//!
//! Tests: Command -> CommandDispatcher -> BookingStore
//!
//! Verifies:
//! - Full negotiation flows persist the expected state
//! - Aggregate rejections leave the store untouched
//! - Version conflicts are retried, then surfaced as contention

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Once};

    use chrono::Utc;

    use renthub_auth::Principal;
    use renthub_booking::{
        AcceptProposal, ApproveBooking, Booking, BookingCommand, BookingId, BookingStatus,
        CalendarDate, CancelBooking, CounterPropose, CreateBooking, NegotiationError,
        ProposeSchedule, Terms, TimeSlot, Turn, VoucherRef, CANCELLED_BY_TENANT,
    };
    use renthub_core::{AggregateId, AggregateRoot, ExpectedVersion, TenantId, UserId};

    use crate::booking_store::{BookingStore, InMemoryBookingStore, StoreError};
    use crate::dispatcher::{CommandDispatcher, DispatchError};

    static TRACING: Once = Once::new();

    fn setup() -> CommandDispatcher<Arc<InMemoryBookingStore>> {
        TRACING.call_once(renthub_observability::init);
        CommandDispatcher::new(Arc::new(InMemoryBookingStore::new()))
    }

    fn test_booking_id() -> BookingId {
        BookingId::new(AggregateId::new())
    }

    fn today() -> CalendarDate {
        CalendarDate::parse("2025-06-01").unwrap()
    }

    fn terms(date: &str, slot: &str) -> Terms {
        Terms::new(
            CalendarDate::parse(date).unwrap(),
            TimeSlot::parse(slot).unwrap(),
        )
    }

    fn create_cmd(booking_id: BookingId, tenant_id: TenantId) -> BookingCommand {
        BookingCommand::Create(CreateBooking {
            booking_id,
            tenant_id,
            resource_id: None,
            requested: terms("2025-06-02", "08:00-09:00"),
            voucher: Some(VoucherRef::new("laundry/vouchers/v-001.png").unwrap()),
            today: today(),
            occurred_at: Utc::now(),
        })
    }

    fn propose_cmd(booking_id: BookingId, actor: Principal, proposed: Terms) -> BookingCommand {
        BookingCommand::Propose(ProposeSchedule {
            booking_id,
            actor,
            proposed,
            today: today(),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn full_negotiation_flow_persists_each_step() {
        let dispatcher = setup();
        let booking_id = test_booking_id();
        let tenant_id = TenantId::new();
        let tenant = Principal::tenant(UserId::new());
        let admin = Principal::administrator(UserId::new());

        let booking = dispatcher
            .dispatch(&create_cmd(booking_id, tenant_id))
            .unwrap();
        assert_eq!(booking.status(), BookingStatus::Pending);
        assert_eq!(booking.awaiting(), Some(Turn::Administrator));

        let booking = dispatcher
            .dispatch(&propose_cmd(
                booking_id,
                admin,
                terms("2025-06-03", "09:00-10:00"),
            ))
            .unwrap();
        assert_eq!(booking.status(), BookingStatus::Proposed);

        let booking = dispatcher
            .dispatch(&BookingCommand::CounterPropose(CounterPropose {
                booking_id,
                actor: tenant,
                counter: terms("2025-06-04", "10:00-11:00"),
                today: today(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        assert_eq!(booking.status(), BookingStatus::CounterProposed);

        let booking = dispatcher
            .dispatch(&BookingCommand::AcceptProposal(AcceptProposal {
                booking_id,
                actor: admin,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        assert_eq!(booking.status(), BookingStatus::Approved);
        assert_eq!(booking.requested(), &terms("2025-06-04", "10:00-11:00"));

        // The store holds the final snapshot with one version per step.
        let stored = dispatcher.store().load(booking_id).unwrap();
        assert_eq!(stored, booking);
        assert_eq!(stored.version(), 4);
    }

    #[test]
    fn tenant_cancel_flow_persists_the_fixed_comment() {
        let dispatcher = setup();
        let booking_id = test_booking_id();
        let tenant = Principal::tenant(UserId::new());
        let admin = Principal::administrator(UserId::new());

        dispatcher
            .dispatch(&create_cmd(booking_id, TenantId::new()))
            .unwrap();
        dispatcher
            .dispatch(&propose_cmd(
                booking_id,
                admin,
                terms("2025-06-03", "09:00-10:00"),
            ))
            .unwrap();
        let booking = dispatcher
            .dispatch(&BookingCommand::Cancel(CancelBooking {
                booking_id,
                actor: tenant,
                occurred_at: Utc::now(),
            }))
            .unwrap();

        assert_eq!(booking.status(), BookingStatus::Rejected);
        assert_eq!(booking.admin_comment(), Some(CANCELLED_BY_TENANT));
    }

    #[test]
    fn rejected_command_leaves_the_store_untouched() {
        let dispatcher = setup();
        let booking_id = test_booking_id();
        let tenant = Principal::tenant(UserId::new());

        dispatcher
            .dispatch(&create_cmd(booking_id, TenantId::new()))
            .unwrap();
        let before = dispatcher.store().load(booking_id).unwrap();

        // Pending bookings wait on the administrator.
        let err = dispatcher
            .dispatch(&BookingCommand::Approve(ApproveBooking {
                booking_id,
                actor: tenant,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Negotiation(NegotiationError::NotYourTurn {
                waiting_on: Turn::Administrator
            })
        ));
        assert_eq!(dispatcher.store().load(booking_id).unwrap(), before);
    }

    #[test]
    fn command_for_unknown_booking_is_not_found() {
        let dispatcher = setup();

        let err = dispatcher
            .dispatch(&BookingCommand::Approve(ApproveBooking {
                booking_id: test_booking_id(),
                actor: Principal::administrator(UserId::new()),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Negotiation(NegotiationError::NotFound)
        ));
    }

    #[test]
    fn stale_save_is_a_version_conflict() {
        let dispatcher = setup();
        let booking_id = test_booking_id();

        let booking = dispatcher
            .dispatch(&create_cmd(booking_id, TenantId::new()))
            .unwrap();

        // A writer holding a stale version loses the race.
        let err = dispatcher
            .store()
            .load(booking_id)
            .and_then(|_| dispatcher.store().save(&booking, ExpectedVersion::Exact(0)))
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { actual: 1, .. }));
    }

    /// Store that fails the first `failures` saves with a version conflict,
    /// then delegates. Models a concurrent writer winning the first round.
    struct FlakyStore {
        inner: InMemoryBookingStore,
        failures: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                inner: InMemoryBookingStore::new(),
                failures: AtomicU32::new(failures),
            }
        }
    }

    impl BookingStore for FlakyStore {
        fn load(&self, booking_id: BookingId) -> Result<Booking, StoreError> {
            self.inner.load(booking_id)
        }

        fn save(
            &self,
            booking: &Booking,
            expected_version: ExpectedVersion,
        ) -> Result<(), StoreError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::VersionConflict {
                    expected: expected_version,
                    actual: booking.version(),
                });
            }
            self.inner.save(booking, expected_version)
        }

        fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
            self.inner.list_all()
        }

        fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<Booking>, StoreError> {
            self.inner.list_for_tenant(tenant_id)
        }
    }

    #[test]
    fn dispatcher_retries_through_transient_conflicts() {
        TRACING.call_once(renthub_observability::init);
        let dispatcher = CommandDispatcher::new(FlakyStore::new(2));
        let booking_id = test_booking_id();

        let booking = dispatcher
            .dispatch(&create_cmd(booking_id, TenantId::new()))
            .unwrap();

        assert_eq!(booking.status(), BookingStatus::Pending);
        assert_eq!(dispatcher.store().load(booking_id).unwrap(), booking);
    }

    #[test]
    fn dispatcher_gives_up_under_sustained_contention() {
        TRACING.call_once(renthub_observability::init);
        let dispatcher = CommandDispatcher::with_max_attempts(FlakyStore::new(u32::MAX), 3);

        let err = dispatcher
            .dispatch(&create_cmd(test_booking_id(), TenantId::new()))
            .unwrap_err();

        assert!(matches!(err, DispatchError::Contention { attempts: 3 }));
    }

    #[test]
    fn tenant_listing_is_scoped_to_the_tenant() {
        let dispatcher = setup();
        let mine = TenantId::new();
        let other = TenantId::new();

        dispatcher.dispatch(&create_cmd(test_booking_id(), mine)).unwrap();
        dispatcher.dispatch(&create_cmd(test_booking_id(), mine)).unwrap();
        dispatcher.dispatch(&create_cmd(test_booking_id(), other)).unwrap();

        let visible = dispatcher.store().list_for_tenant(mine).unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|b| b.tenant_id() == Some(mine)));
        assert_eq!(dispatcher.store().list_all().unwrap().len(), 3);
    }
}
