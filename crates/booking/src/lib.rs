//! Laundry booking negotiation domain (pure, deterministic).
//!
//! This crate contains the booking aggregate and the two-party negotiation
//! protocol between a tenant and an administrator over a scarce laundry slot.
//! No IO, no HTTP, no storage: callers load a [`Booking`], run a command
//! through [`renthub_core::Aggregate::handle`], apply the resulting events,
//! and persist the outcome themselves.

pub mod booking;
pub mod error;
pub mod slot;

pub use booking::{
    AcceptProposal, ApproveBooking, Booking, BookingCommand, BookingEvent, BookingId,
    BookingStatus, CancelBooking, CounterPropose, CreateBooking, ProposeSchedule, RejectBooking,
    ResourceId, Turn, VoucherRef, CANCELLED_BY_TENANT,
};
pub use error::{NegotiationError, NegotiationResult, ValidationKind};
pub use slot::{CalendarDate, Terms, TimeSlot};
