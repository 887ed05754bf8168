//! Persistent store abstraction for slots and bookings.
//!
//! # Atomicity
//!
//! Operations that change a slot counter are single atomic units:
//!
//! - [`BookingStore::reserve_slot`] performs the capacity check, the increment
//!   and the booking insert together. Either all take effect or none.
//! - [`BookingStore::cancel_booking`] deletes the booking and decrements the
//!   counter together, never below zero.
//! - [`BookingStore::claim_email_delivery`] moves the email state to `Sent`
//!   with a conditional update, so two concurrent senders cannot both claim it.
//!
//! Callers never read a counter and write it back.
//!
//! # Implementations
//!
//! - `PostgresBookingStore` (in `tree-farm-postgres`): production store
//! - `InMemoryBookingStore` (in `tree-farm-testing`): fast, deterministic testing

use crate::error::StoreError;
use crate::types::{
    AvailableSlot, Booking, BookingToken, DateRange, EmailStatus, HalfHour, OpenDate, OpenDateId,
    OpenDateSummary, Slot, SlotDetails, SlotId,
};
use chrono::NaiveDate;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`BookingStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Outcome of [`BookingStore::claim_email_delivery`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailClaim {
    /// The booking is now `Sent`; the caller must deliver the message.
    Claimed {
        /// State before the claim
        previous: EmailStatus,
    },
    /// The booking was already `Sent` and no resend was requested.
    AlreadySent,
}

/// Storage for open dates, slots and bookings.
///
/// Uses explicit boxed futures so the trait stays dyn-compatible and can be
/// shared as `Arc<dyn BookingStore>`.
pub trait BookingStore: Send + Sync {
    /// Check connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the store is unreachable.
    fn ping(&self) -> StoreFuture<'_, ()>;

    /// Open `date` for booking: create the open date if needed and one empty
    /// slot per half-hour. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn open_date(&self, date: NaiveDate) -> StoreFuture<'_, OpenDate>;

    /// All half-hours ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn list_half_hours(&self) -> StoreFuture<'_, Vec<HalfHour>>;

    /// Open dates within `range` having at least one slot below capacity,
    /// with AM/PM occupancy totals, ordered by date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn list_open_dates(&self, range: DateRange) -> StoreFuture<'_, Vec<OpenDateSummary>>;

    /// Look up an open date by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn find_open_date(&self, id: OpenDateId) -> StoreFuture<'_, Option<OpenDate>>;

    /// Slots of the date below capacity, joined with their half-hour,
    /// ordered by half-hour id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn list_available_slots(&self, id: OpenDateId) -> StoreFuture<'_, Vec<AvailableSlot>>;

    /// Every slot, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn list_slots(&self) -> StoreFuture<'_, Vec<Slot>>;

    /// Look up a slot with its date and half-hour.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn find_slot(&self, id: SlotId) -> StoreFuture<'_, Option<SlotDetails>>;

    /// Whether a booking with this token exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn token_exists<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, bool>;

    /// Atomically increment the slot counter if below capacity and record a
    /// booking under `token` with email state `Pending`.
    ///
    /// Returns the slot after the increment.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SlotNotFound`] if the slot does not exist
    /// - [`StoreError::SlotFull`] if the slot is at capacity (nothing changed)
    /// - [`StoreError::DuplicateToken`] if the token is taken (nothing changed)
    /// - [`StoreError::Database`] on storage failure
    fn reserve_slot<'a>(&'a self, slot: SlotId, token: &'a BookingToken) -> StoreFuture<'a, Slot>;

    /// Look up a booking by token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    fn find_booking<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, Option<Booking>>;

    /// Atomically claim the confirmation email for delivery by moving the
    /// email state to `Sent`.
    ///
    /// Without `resend` the claim only succeeds when the state is not already
    /// `Sent`. With `resend` it always succeeds.
    ///
    /// # Errors
    ///
    /// - [`StoreError::BookingNotFound`] if no booking has this token
    /// - [`StoreError::Database`] on storage failure
    fn claim_email_delivery<'a>(
        &'a self,
        token: &'a BookingToken,
        resend: bool,
    ) -> StoreFuture<'a, EmailClaim>;

    /// Overwrite the email state of a booking.
    ///
    /// # Errors
    ///
    /// - [`StoreError::BookingNotFound`] if no booking has this token
    /// - [`StoreError::Database`] on storage failure
    fn record_email_status<'a>(
        &'a self,
        token: &'a BookingToken,
        status: EmailStatus,
    ) -> StoreFuture<'a, ()>;

    /// Atomically delete the booking and decrement its slot counter
    /// (never below zero).
    ///
    /// Returns the slot after the decrement.
    ///
    /// # Errors
    ///
    /// - [`StoreError::BookingNotFound`] if no booking has this token
    /// - [`StoreError::Database`] on storage failure
    fn cancel_booking<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, Slot>;
}
