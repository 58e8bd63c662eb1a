//! Negotiation error taxonomy.
//!
//! All of these are plain value returns: expected business-rule violations
//! never panic. They are `Clone + PartialEq` so tests can compare them and
//! callers can match on them exhaustively.

use thiserror::Error;

use crate::booking::{BookingStatus, Turn};

/// Result type for negotiation operations.
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// What exactly failed validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// A date was malformed or lies before the injected "today".
    InvalidDate,
    /// A slot is not one of the 24 canonical one-hour windows.
    InvalidSlot,
    /// The payment voucher reference is absent or empty.
    MissingVoucher,
}

impl core::fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ValidationKind::InvalidDate => "invalid date",
            ValidationKind::InvalidSlot => "invalid slot",
            ValidationKind::MissingVoucher => "missing voucher",
        })
    }
}

/// Error returned by the negotiation engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// Malformed input; recoverable by the caller re-prompting.
    #[error("validation failed ({kind}): {message}")]
    Validation {
        kind: ValidationKind,
        message: String,
    },

    /// The acting party must wait for the other side to move.
    #[error("not your turn: waiting on the {waiting_on}")]
    NotYourTurn { waiting_on: Turn },

    /// The action is not defined for the booking's current status
    /// (including any action on a terminal booking). Surfaced to callers as
    /// a stale-state error: refresh the aggregate and re-render.
    #[error("invalid transition: cannot {action} a {status} booking")]
    InvalidTransition {
        action: &'static str,
        status: BookingStatus,
    },

    /// Acting on a booking that was never created.
    #[error("booking not found")]
    NotFound,

    /// Contract breach between caller and aggregate (e.g. creating a booking
    /// that already exists, or an id mismatch).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl NegotiationError {
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::Validation {
            kind: ValidationKind::InvalidDate,
            message: message.into(),
        }
    }

    pub fn invalid_slot(message: impl Into<String>) -> Self {
        Self::Validation {
            kind: ValidationKind::InvalidSlot,
            message: message.into(),
        }
    }

    pub fn missing_voucher(message: impl Into<String>) -> Self {
        Self::Validation {
            kind: ValidationKind::MissingVoucher,
            message: message.into(),
        }
    }

    pub fn not_your_turn(waiting_on: Turn) -> Self {
        Self::NotYourTurn { waiting_on }
    }

    pub fn invalid_transition(action: &'static str, status: BookingStatus) -> Self {
        Self::InvalidTransition { action, status }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// The validation kind, if this is a validation error.
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            Self::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
