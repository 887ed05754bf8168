//! The booking transaction.
//!
//! ```text
//! find slot ──▶ full? ──▶ mint token ──▶ token exists? ──▶ reserve_slot (atomic)
//!     │           │                           │                 │
//!  notFound    isFull                    collision      isFull / collision
//! ```
//!
//! The early full check only saves work; the conditional increment inside
//! [`BookingStore::reserve_slot`] is what enforces capacity.

use crate::metrics;
use std::sync::Arc;
use tracing::{error, info};
use tree_farm_core::{
    BookingConfirmation, BookingError, BookingStore, Clock, SlotId, TokenMinter, is_valid_email,
};

/// Books slots and mints their tokens.
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    minter: TokenMinter,
}

impl BookingService {
    /// Create a new booking service.
    #[must_use]
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, minter: TokenMinter) -> Self {
        Self {
            store,
            clock,
            minter,
        }
    }

    /// Book one place in `slot_id` for `email`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidBody`]: malformed email
    /// - [`BookingError::ReservationNotFound`]: unknown slot
    /// - [`BookingError::ReservationIsFull`]: slot at capacity
    /// - [`BookingError::TokenCollision`]: the minted token already exists
    /// - [`BookingError::Store`]: storage failure
    pub async fn book(
        &self,
        slot_id: SlotId,
        email: &str,
    ) -> Result<BookingConfirmation, BookingError> {
        let result = self.try_book(slot_id, email).await;
        metrics::record_booking(result.as_ref().map(|_| ()));
        result
    }

    async fn try_book(
        &self,
        slot_id: SlotId,
        email: &str,
    ) -> Result<BookingConfirmation, BookingError> {
        if !is_valid_email(email) {
            return Err(BookingError::InvalidBody(format!(
                "Invalid email address: {email}"
            )));
        }

        let details = self
            .store
            .find_slot(slot_id)
            .await?
            .ok_or(BookingError::ReservationNotFound)?;

        if details.slot.is_full() {
            return Err(BookingError::ReservationIsFull);
        }

        let token = self.minter.mint(&details.slot, email, self.clock.now());

        if self.store.token_exists(&token).await? {
            error!(slot_id = %slot_id, "Minted booking token already exists");
            return Err(BookingError::TokenCollision);
        }

        let slot = match self.store.reserve_slot(slot_id, &token).await {
            Ok(slot) => slot,
            Err(store_error) => {
                let error = BookingError::from(store_error);
                if matches!(error, BookingError::TokenCollision) {
                    error!(slot_id = %slot_id, "Booking token collided on insert");
                }
                return Err(error);
            }
        };

        info!(
            slot_id = %slot.id,
            date = %details.open_date.date,
            period = %details.half_hour.period,
            count = slot.count,
            "Slot booked"
        );

        Ok(BookingConfirmation {
            token,
            email: email.to_string(),
            date: details.open_date.date,
            time: details.half_hour.display_time(),
        })
    }
}
