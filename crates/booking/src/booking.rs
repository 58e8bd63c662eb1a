//! Booking aggregate and the tenant/administrator negotiation protocol.
//!
//! The state machine (initial state `pending`, terminals `approved` and
//! `rejected`):
//!
//! ```text
//! pending ──approve──────────────────────▶ approved
//! pending ──reject(comment)──────────────▶ rejected
//! pending ──propose(date,slot)───────────▶ proposed            (turn → tenant)
//! proposed ──accept_proposal─────────────▶ approved            (proposed terms become final)
//! proposed ──counter_propose(date,slot)──▶ counter_proposed    (turn → administrator)
//! proposed ──cancel──────────────────────▶ rejected            ("cancelled by tenant")
//! counter_proposed ──accept_proposal─────▶ approved            (counter terms become final)
//! counter_proposed ──propose(date,slot)──▶ proposed            (turn → tenant)
//! counter_proposed ──reject(comment)─────▶ rejected
//! ```
//!
//! At most one party may act at any time: an actor whose role does not match
//! the booking's `turn` gets `NotYourTurn`, which is what prevents lost-update
//! races between tenant and administrator edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use renthub_auth::{ActorRole, Principal};
use renthub_core::{Aggregate, AggregateId, AggregateRoot, TenantId, UserId, ValueObject};
use renthub_events::Event;

use crate::error::{NegotiationError, NegotiationResult};
use crate::slot::{CalendarDate, Terms};

/// Fixed rejection comment recorded when a tenant cancels a standing proposal.
pub const CANCELLED_BY_TENANT: &str = "cancelled by tenant";

/// Booking identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub AggregateId);

impl BookingId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for BookingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of a physical laundry unit.
///
/// Optional on bookings: single-resource deployments omit it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub AggregateId);

impl ResourceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Booking negotiation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Proposed,
    CounterProposed,
    Approved,
    Rejected,
}

impl BookingStatus {
    /// Terminal bookings accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Approved | BookingStatus::Rejected)
    }
}

impl core::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Proposed => "proposed",
            BookingStatus::CounterProposed => "counter_proposed",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
        })
    }
}

/// Which party is authorized to act next on a booking.
///
/// Irrelevant once the booking is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    Tenant,
    Administrator,
}

impl Turn {
    pub fn matches(self, role: ActorRole) -> bool {
        matches!(
            (self, role),
            (Turn::Tenant, ActorRole::Tenant) | (Turn::Administrator, ActorRole::Administrator)
        )
    }
}

impl core::fmt::Display for Turn {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Turn::Tenant => "tenant",
            Turn::Administrator => "administrator",
        })
    }
}

/// Opaque handle to an uploaded payment voucher.
///
/// The core never resolves it; voucher storage is an external collaborator.
/// Non-empty by construction and immutable once attached to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoucherRef(String);

impl VoucherRef {
    pub fn new(reference: impl Into<String>) -> NegotiationResult<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(NegotiationError::missing_voucher(
                "voucher reference must not be empty",
            ));
        }
        Ok(Self(reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for VoucherRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VoucherRef {
    type Error = NegotiationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VoucherRef> for String {
    fn from(value: VoucherRef) -> Self {
        value.0
    }
}

impl ValueObject for VoucherRef {}

/// Aggregate root: one laundry reservation request and its negotiation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    id: BookingId,
    tenant_id: Option<TenantId>,
    resource_id: Option<ResourceId>,
    /// The tenant's original ask; overwritten only when a proposal is
    /// accepted (the agreed terms become the final ones).
    requested: Terms,
    /// Administrator's standing counter-offer (`status == proposed`).
    proposed: Option<Terms>,
    /// Tenant's standing counter-counter-offer (`status == counter_proposed`).
    counter: Option<Terms>,
    status: BookingStatus,
    turn: Turn,
    admin_comment: Option<String>,
    /// Administrator who last acted on the booking, if any.
    reviewed_by: Option<UserId>,
    voucher: Option<VoucherRef>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    created: bool,
}

impl Booking {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: BookingId) -> Self {
        Self {
            id,
            tenant_id: None,
            resource_id: None,
            requested: Terms::default(),
            proposed: None,
            counter: None,
            status: BookingStatus::Pending,
            turn: Turn::Administrator,
            admin_comment: None,
            reviewed_by: None,
            voucher: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> BookingId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn resource_id(&self) -> Option<ResourceId> {
        self.resource_id
    }

    /// The currently binding terms: the original ask, or the agreed terms
    /// once a proposal has been accepted.
    pub fn requested(&self) -> &Terms {
        &self.requested
    }

    pub fn proposed(&self) -> Option<&Terms> {
        self.proposed.as_ref()
    }

    pub fn counter(&self) -> Option<&Terms> {
        self.counter.as_ref()
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    /// Whose action is awaited, or `None` once the booking is terminal.
    pub fn awaiting(&self) -> Option<Turn> {
        (!self.status.is_terminal()).then_some(self.turn)
    }

    pub fn admin_comment(&self) -> Option<&str> {
        self.admin_comment.as_deref()
    }

    pub fn reviewed_by(&self) -> Option<UserId> {
        self.reviewed_by
    }

    pub fn voucher(&self) -> Option<&VoucherRef> {
        self.voucher.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `role` may currently act on this booking at all.
    pub fn is_actionable_by(&self, role: ActorRole) -> bool {
        self.created && !self.is_terminal() && self.turn.matches(role)
    }
}

impl AggregateRoot for Booking {
    type Id = BookingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: the tenant requests a slot (creation; always enters `pending`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub booking_id: BookingId,
    pub tenant_id: TenantId,
    pub resource_id: Option<ResourceId>,
    pub requested: Terms,
    /// Required; `None` fails with `MissingVoucher`.
    pub voucher: Option<VoucherRef>,
    pub today: CalendarDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: the administrator approves the request as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveBooking {
    pub booking_id: BookingId,
    pub actor: Principal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: the administrator rejects, with a reason for the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectBooking {
    pub booking_id: BookingId,
    pub actor: Principal,
    pub comment: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: the administrator offers an alternative date/slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeSchedule {
    pub booking_id: BookingId,
    pub actor: Principal,
    pub proposed: Terms,
    pub today: CalendarDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: accept the other party's standing offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptProposal {
    pub booking_id: BookingId,
    pub actor: Principal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: the tenant answers a proposal with their own alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterPropose {
    pub booking_id: BookingId,
    pub actor: Principal,
    pub counter: Terms,
    pub today: CalendarDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: the tenant withdraws from a standing proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBooking {
    pub booking_id: BookingId,
    pub actor: Principal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCommand {
    Create(CreateBooking),
    Approve(ApproveBooking),
    Reject(RejectBooking),
    Propose(ProposeSchedule),
    AcceptProposal(AcceptProposal),
    CounterPropose(CounterPropose),
    Cancel(CancelBooking),
}

impl BookingCommand {
    pub fn booking_id(&self) -> BookingId {
        match self {
            BookingCommand::Create(c) => c.booking_id,
            BookingCommand::Approve(c) => c.booking_id,
            BookingCommand::Reject(c) => c.booking_id,
            BookingCommand::Propose(c) => c.booking_id,
            BookingCommand::AcceptProposal(c) => c.booking_id,
            BookingCommand::CounterPropose(c) => c.booking_id,
            BookingCommand::Cancel(c) => c.booking_id,
        }
    }
}

/// Event: BookingRequested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequested {
    pub booking_id: BookingId,
    pub tenant_id: TenantId,
    pub resource_id: Option<ResourceId>,
    pub requested: Terms,
    pub voucher: VoucherRef,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BookingApproved (direct approval of the original ask).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingApproved {
    pub booking_id: BookingId,
    pub reviewed_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BookingRejected.
///
/// `reviewed_by` is `None` when the rejection is a tenant cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRejected {
    pub booking_id: BookingId,
    pub reviewed_by: Option<UserId>,
    pub comment: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ScheduleProposed (administrator counter-offer; replaces any
/// standing tenant counter-proposal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleProposed {
    pub booking_id: BookingId,
    pub reviewed_by: UserId,
    pub proposed: Terms,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CounterProposed (tenant counter-counter-offer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterProposed {
    pub booking_id: BookingId,
    pub counter: Terms,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProposalAccepted. The standing offer becomes the final terms.
///
/// `reviewed_by` is `Some` when the administrator accepted a tenant
/// counter-proposal, `None` when the tenant accepted an administrator one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalAccepted {
    pub booking_id: BookingId,
    pub agreed: Terms,
    pub reviewed_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    BookingRequested(BookingRequested),
    BookingApproved(BookingApproved),
    BookingRejected(BookingRejected),
    ScheduleProposed(ScheduleProposed),
    CounterProposed(CounterProposed),
    ProposalAccepted(ProposalAccepted),
}

impl Event for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::BookingRequested(_) => "laundry.booking.requested",
            BookingEvent::BookingApproved(_) => "laundry.booking.approved",
            BookingEvent::BookingRejected(_) => "laundry.booking.rejected",
            BookingEvent::ScheduleProposed(_) => "laundry.booking.schedule_proposed",
            BookingEvent::CounterProposed(_) => "laundry.booking.counter_proposed",
            BookingEvent::ProposalAccepted(_) => "laundry.booking.proposal_accepted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BookingEvent::BookingRequested(e) => e.occurred_at,
            BookingEvent::BookingApproved(e) => e.occurred_at,
            BookingEvent::BookingRejected(e) => e.occurred_at,
            BookingEvent::ScheduleProposed(e) => e.occurred_at,
            BookingEvent::CounterProposed(e) => e.occurred_at,
            BookingEvent::ProposalAccepted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Booking {
    type Command = BookingCommand;
    type Event = BookingEvent;
    type Error = NegotiationError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            BookingEvent::BookingRequested(e) => {
                self.id = e.booking_id;
                self.tenant_id = Some(e.tenant_id);
                self.resource_id = e.resource_id;
                self.requested = e.requested;
                self.proposed = None;
                self.counter = None;
                self.status = BookingStatus::Pending;
                self.turn = Turn::Administrator;
                self.admin_comment = None;
                self.reviewed_by = None;
                self.voucher = Some(e.voucher.clone());
                self.created_at = e.occurred_at;
                self.created = true;
            }
            BookingEvent::BookingApproved(e) => {
                self.status = BookingStatus::Approved;
                self.reviewed_by = Some(e.reviewed_by);
            }
            BookingEvent::BookingRejected(e) => {
                self.status = BookingStatus::Rejected;
                self.admin_comment = Some(e.comment.clone());
                if e.reviewed_by.is_some() {
                    self.reviewed_by = e.reviewed_by;
                }
            }
            BookingEvent::ScheduleProposed(e) => {
                self.proposed = Some(e.proposed);
                // An administrator re-proposal supersedes the tenant counter.
                self.counter = None;
                self.status = BookingStatus::Proposed;
                self.turn = Turn::Tenant;
                self.reviewed_by = Some(e.reviewed_by);
            }
            BookingEvent::CounterProposed(e) => {
                self.counter = Some(e.counter);
                self.status = BookingStatus::CounterProposed;
                self.turn = Turn::Administrator;
            }
            BookingEvent::ProposalAccepted(e) => {
                self.requested = e.agreed;
                self.proposed = None;
                self.counter = None;
                self.status = BookingStatus::Approved;
                if e.reviewed_by.is_some() {
                    self.reviewed_by = e.reviewed_by;
                }
            }
        }

        self.updated_at = event.occurred_at();
        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            BookingCommand::Create(cmd) => self.handle_create(cmd),
            BookingCommand::Approve(cmd) => self.handle_approve(cmd),
            BookingCommand::Reject(cmd) => self.handle_reject(cmd),
            BookingCommand::Propose(cmd) => self.handle_propose(cmd),
            BookingCommand::AcceptProposal(cmd) => self.handle_accept_proposal(cmd),
            BookingCommand::CounterPropose(cmd) => self.handle_counter_propose(cmd),
            BookingCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Booking {
    /// Shared guards, checked in a fixed order: existence, id match,
    /// terminality, then turn. Terminality outranks turn so that terminal
    /// bookings uniformly fail with `InvalidTransition` (the turn field has
    /// no effect once terminal).
    fn ensure_actionable(
        &self,
        booking_id: BookingId,
        actor: &Principal,
        action: &'static str,
    ) -> NegotiationResult<()> {
        if !self.created {
            return Err(NegotiationError::NotFound);
        }
        if self.id != booking_id {
            return Err(NegotiationError::conflict("booking_id mismatch"));
        }
        if self.status.is_terminal() {
            return Err(NegotiationError::invalid_transition(action, self.status));
        }
        if !self.turn.matches(actor.role) {
            return Err(NegotiationError::not_your_turn(self.turn));
        }
        Ok(())
    }

    fn ensure_not_past(date: CalendarDate, today: CalendarDate) -> NegotiationResult<()> {
        if date.is_on_or_after(today) {
            Ok(())
        } else {
            Err(NegotiationError::invalid_date(format!(
                "{date} is before {today}"
            )))
        }
    }

    fn handle_create(&self, cmd: &CreateBooking) -> NegotiationResult<Vec<BookingEvent>> {
        if self.created {
            return Err(NegotiationError::conflict("booking already exists"));
        }

        let voucher = cmd.voucher.clone().ok_or_else(|| {
            NegotiationError::missing_voucher("a payment voucher is required to book a slot")
        })?;
        Self::ensure_not_past(cmd.requested.date, cmd.today)?;

        Ok(vec![BookingEvent::BookingRequested(BookingRequested {
            booking_id: cmd.booking_id,
            tenant_id: cmd.tenant_id,
            resource_id: cmd.resource_id,
            requested: cmd.requested,
            voucher,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveBooking) -> NegotiationResult<Vec<BookingEvent>> {
        self.ensure_actionable(cmd.booking_id, &cmd.actor, "approve")?;

        if self.status != BookingStatus::Pending {
            return Err(NegotiationError::invalid_transition("approve", self.status));
        }

        Ok(vec![BookingEvent::BookingApproved(BookingApproved {
            booking_id: cmd.booking_id,
            reviewed_by: cmd.actor.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectBooking) -> NegotiationResult<Vec<BookingEvent>> {
        self.ensure_actionable(cmd.booking_id, &cmd.actor, "reject")?;

        // Not available from `proposed`: only the tenant may terminate a
        // standing proposal, via `cancel`.
        if !matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::CounterProposed
        ) {
            return Err(NegotiationError::invalid_transition("reject", self.status));
        }

        Ok(vec![BookingEvent::BookingRejected(BookingRejected {
            booking_id: cmd.booking_id,
            reviewed_by: Some(cmd.actor.user_id),
            comment: cmd.comment.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_propose(&self, cmd: &ProposeSchedule) -> NegotiationResult<Vec<BookingEvent>> {
        self.ensure_actionable(cmd.booking_id, &cmd.actor, "propose")?;

        if !matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::CounterProposed
        ) {
            return Err(NegotiationError::invalid_transition("propose", self.status));
        }
        Self::ensure_not_past(cmd.proposed.date, cmd.today)?;

        Ok(vec![BookingEvent::ScheduleProposed(ScheduleProposed {
            booking_id: cmd.booking_id,
            reviewed_by: cmd.actor.user_id,
            proposed: cmd.proposed,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_accept_proposal(&self, cmd: &AcceptProposal) -> NegotiationResult<Vec<BookingEvent>> {
        self.ensure_actionable(cmd.booking_id, &cmd.actor, "accept_proposal")?;

        let (agreed, reviewed_by) = match self.status {
            BookingStatus::Proposed => {
                let terms = self
                    .proposed
                    .ok_or_else(|| NegotiationError::conflict("proposed terms missing"))?;
                (terms, None)
            }
            BookingStatus::CounterProposed => {
                let terms = self
                    .counter
                    .ok_or_else(|| NegotiationError::conflict("counter terms missing"))?;
                (terms, Some(cmd.actor.user_id))
            }
            _ => {
                return Err(NegotiationError::invalid_transition(
                    "accept_proposal",
                    self.status,
                ));
            }
        };

        Ok(vec![BookingEvent::ProposalAccepted(ProposalAccepted {
            booking_id: cmd.booking_id,
            agreed,
            reviewed_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_counter_propose(&self, cmd: &CounterPropose) -> NegotiationResult<Vec<BookingEvent>> {
        self.ensure_actionable(cmd.booking_id, &cmd.actor, "counter_propose")?;

        if self.status != BookingStatus::Proposed {
            return Err(NegotiationError::invalid_transition(
                "counter_propose",
                self.status,
            ));
        }
        Self::ensure_not_past(cmd.counter.date, cmd.today)?;

        Ok(vec![BookingEvent::CounterProposed(CounterProposed {
            booking_id: cmd.booking_id,
            counter: cmd.counter,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelBooking) -> NegotiationResult<Vec<BookingEvent>> {
        self.ensure_actionable(cmd.booking_id, &cmd.actor, "cancel")?;

        if self.status != BookingStatus::Proposed {
            return Err(NegotiationError::invalid_transition("cancel", self.status));
        }

        Ok(vec![BookingEvent::BookingRejected(BookingRejected {
            booking_id: cmd.booking_id,
            reviewed_by: None,
            comment: CANCELLED_BY_TENANT.to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
