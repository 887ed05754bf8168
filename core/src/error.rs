//! Error taxonomy for the booking service.
//!
//! Stores report [`StoreError`], email providers report [`EmailError`], and the
//! services translate both into [`BookingError`], which carries the
//! machine-readable code returned to clients.

use crate::types::{OpenDateId, SlotId};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors reported by [`BookingStore`](crate::store::BookingStore) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying database failure (connection, query, decoding).
    #[error("Database error: {0}")]
    Database(String),

    /// The conditional increment found the slot at capacity.
    #[error("Slot {0} is full")]
    SlotFull(SlotId),

    /// No slot with this id exists.
    #[error("Slot {0} not found")]
    SlotNotFound(SlotId),

    /// A booking with the same token already exists.
    #[error("Booking token already exists")]
    DuplicateToken,

    /// No booking with the given token exists.
    #[error("Booking not found")]
    BookingNotFound,
}

/// Errors reported by [`EmailProvider`](crate::email::EmailProvider) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The message could not be built (bad address, invalid header).
    #[error("Invalid email message: {0}")]
    InvalidMessage(String),

    /// The transport failed to deliver the message.
    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// Errors surfaced by the booking services.
///
/// Every variant maps to a stable wire code through [`BookingError::code`].
#[derive(Error, Debug)]
pub enum BookingError {
    /// Request body missing required fields or malformed.
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// `dateId` parameter missing or not an integer.
    #[error("Invalid dateId: {0}")]
    InvalidDateId(String),

    /// Date range with `from` after `to`.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange {
        /// Lower bound
        from: NaiveDate,
        /// Upper bound
        to: NaiveDate,
    },

    /// Token parameter missing or empty.
    #[error("Reservation hash is missing")]
    HashMissing,

    /// No open date with the requested id.
    #[error("Date {0} not found")]
    DateNotFound(OpenDateId),

    /// No slot with the requested id, or no booking with the given token.
    #[error("Reservation not found")]
    ReservationNotFound,

    /// The slot is at capacity.
    #[error("Reservation is full")]
    ReservationIsFull,

    /// Confirmation email delivery failed; the booking is kept.
    #[error("Failed to send confirmation email: {0}")]
    Email(#[from] EmailError),

    /// A freshly minted token matched an existing booking.
    #[error("Booking token collision")]
    TokenCollision,

    /// Storage failure.
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl BookingError {
    /// Machine-readable error code returned in the `error` field.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidBody(_) => "invalidBody",
            Self::InvalidDateId(_) => "invalidDateId",
            Self::InvalidDateRange { .. } => "invalidDateRange",
            Self::HashMissing => "hashMissing",
            Self::DateNotFound(_) => "dateNotFound",
            Self::ReservationNotFound => "reservationNotFound",
            Self::ReservationIsFull => "reservationIsFull",
            Self::Email(_) => "emailError",
            Self::TokenCollision | Self::Store(_) => "unknownError",
        }
    }

    /// Whether the error is a server-side failure rather than a client mistake.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Email(_) | Self::TokenCollision | Self::Store(_))
    }
}

impl From<StoreError> for BookingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::SlotFull(_) => Self::ReservationIsFull,
            StoreError::SlotNotFound(_) | StoreError::BookingNotFound => Self::ReservationNotFound,
            StoreError::DuplicateToken => Self::TokenCollision,
            StoreError::Database(_) => Self::Store(error),
        }
    }
}
