//! Confirmation and cancellation lifecycle of a booking.
//!
//! ```text
//! Pending ──claim──▶ Sent ──delivery failed──▶ Failed
//!    │                 │                          │
//!    └─────────────────┴────── cancel ────────────┴──▶ (deleted)
//! ```
//!
//! The claim is a single conditional update in the store, so two concurrent
//! senders never both deliver. A failed delivery writes `Failed` back and the
//! booking stays in place.

use crate::metrics;
use std::sync::Arc;
use tracing::{error, info, warn};
use tree_farm_core::{
    Booking, BookingConfirmation, BookingError, BookingStore, BookingToken, ConfirmationDetails,
    EmailClaim, EmailProvider, EmailStatus, Language, Slot,
};

/// Result of a confirmation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The message was delivered
    Sent,
    /// The booking was already confirmed and no resend was requested
    AlreadySent,
}

impl ConfirmationOutcome {
    /// Value of the `message` field in responses.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Sent => "emailSent",
            Self::AlreadySent => "emailAlreadySent",
        }
    }

    const fn metric_outcome(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::AlreadySent => "already_sent",
        }
    }
}

/// Parse the `hash` parameter of a request.
///
/// # Errors
///
/// Returns [`BookingError::HashMissing`] when absent or blank.
pub fn require_token(hash: Option<&str>) -> Result<BookingToken, BookingError> {
    match hash.map(str::trim) {
        Some(hash) if !hash.is_empty() => Ok(BookingToken::new(hash)),
        _ => Err(BookingError::HashMissing),
    }
}

/// Verifies, confirms and cancels bookings by token.
pub struct LifecycleService {
    store: Arc<dyn BookingStore>,
    email: Arc<dyn EmailProvider>,
    consult_url: String,
}

impl LifecycleService {
    /// Create a new lifecycle service.
    #[must_use]
    pub fn new(
        store: Arc<dyn BookingStore>,
        email: Arc<dyn EmailProvider>,
        consult_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            email,
            consult_url: consult_url.into(),
        }
    }

    /// Check that a token identifies a live booking. No state change.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ReservationNotFound`] for unknown tokens, or
    /// [`BookingError::Store`] if the store fails.
    pub async fn verify(&self, token: &BookingToken) -> Result<Booking, BookingError> {
        self.store
            .find_booking(token)
            .await?
            .ok_or(BookingError::ReservationNotFound)
    }

    /// Cancel a booking and release its place.
    ///
    /// Returns the slot after the decrement.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ReservationNotFound`] for unknown or already
    /// canceled tokens, or [`BookingError::Store`] if the store fails.
    pub async fn cancel(&self, token: &BookingToken) -> Result<Slot, BookingError> {
        let result = self
            .store
            .cancel_booking(token)
            .await
            .map_err(BookingError::from);
        metrics::record_cancellation(result.as_ref().map(|_| ()));

        let slot = result?;
        info!(slot_id = %slot.id, count = slot.count, "Booking canceled");
        Ok(slot)
    }

    /// Send (or resend) the confirmation email of a booking.
    ///
    /// Without `resend`, a booking already in `Sent` is not delivered again.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`]: unknown token
    /// - [`BookingError::Email`]: delivery failed; the booking is now `Failed`
    /// - [`BookingError::Store`]: storage failure
    pub async fn send_confirmation(
        &self,
        details: &ConfirmationDetails,
        resend: bool,
    ) -> Result<ConfirmationOutcome, BookingError> {
        let claim = self
            .store
            .claim_email_delivery(&details.token, resend)
            .await?;

        let previous = match claim {
            EmailClaim::AlreadySent => {
                info!(resend, "Confirmation email already sent");
                metrics::record_confirmation_email(ConfirmationOutcome::AlreadySent.metric_outcome());
                return Ok(ConfirmationOutcome::AlreadySent);
            }
            EmailClaim::Claimed { previous } => previous,
        };

        let message = details.compose(&self.consult_url);
        if let Err(delivery_error) = self.email.send(&message).await {
            warn!(
                error = %delivery_error,
                previous = %previous,
                "Confirmation email delivery failed"
            );
            if let Err(store_error) = self
                .store
                .record_email_status(&details.token, EmailStatus::Failed)
                .await
            {
                error!(error = %store_error, "Failed to record email delivery failure");
            }
            metrics::record_confirmation_email("failed");
            return Err(BookingError::Email(delivery_error));
        }

        info!(previous = %previous, resend, "Confirmation email sent");
        metrics::record_confirmation_email(ConfirmationOutcome::Sent.metric_outcome());
        Ok(ConfirmationOutcome::Sent)
    }

    /// Send the confirmation of a booking that was just made.
    ///
    /// # Errors
    ///
    /// Same as [`LifecycleService::send_confirmation`].
    pub async fn confirm_booking(
        &self,
        confirmation: &BookingConfirmation,
        language: Language,
    ) -> Result<ConfirmationOutcome, BookingError> {
        let details = ConfirmationDetails {
            token: confirmation.token.clone(),
            email: confirmation.email.clone(),
            date: language.format_date(confirmation.date),
            time: confirmation.time.clone(),
            raw_date: confirmation.date.format("%Y-%m-%d").to_string(),
            language,
        };
        self.send_confirmation(&details, false).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use tree_farm_core::SlotId;
    use tree_farm_testing::fixtures::{self, CUSTOMER_EMAIL};
    use tree_farm_testing::{InMemoryBookingStore, MockEmailProvider};

    const CONSULT_URL: &str = "https://farm.test/consult";

    fn token(n: u8) -> BookingToken {
        BookingToken::new(format!("{n:064x}"))
    }

    /// Christmas Eve slot with one booking made under `token(1)`.
    async fn booked(store: &InMemoryBookingStore) -> (SlotId, BookingToken) {
        let slot = fixtures::christmas_eve_slot(store);
        let token = token(1);
        store.reserve_slot(slot.id, &token).await.unwrap();
        (slot.id, token)
    }

    fn details(token: &BookingToken) -> ConfirmationDetails {
        ConfirmationDetails {
            token: token.clone(),
            email: CUSTOMER_EMAIL.to_string(),
            date: "December 24".to_string(),
            time: "9h00".to_string(),
            raw_date: "2024-12-24".to_string(),
            language: Language::English,
        }
    }

    fn service(store: &InMemoryBookingStore, email: &MockEmailProvider) -> LifecycleService {
        LifecycleService::new(Arc::new(store.clone()), Arc::new(email.clone()), CONSULT_URL)
    }

    #[test]
    fn test_require_token() {
        assert!(matches!(require_token(None), Err(BookingError::HashMissing)));
        assert!(matches!(require_token(Some("  ")), Err(BookingError::HashMissing)));
        assert_eq!(require_token(Some("abc")).unwrap().as_str(), "abc");
    }

    #[tokio::test]
    async fn test_send_twice_delivers_once() {
        let store = InMemoryBookingStore::new();
        let email = MockEmailProvider::new();
        let (_, token) = booked(&store).await;
        let service = service(&store, &email);

        let first = service.send_confirmation(&details(&token), false).await.unwrap();
        let second = service.send_confirmation(&details(&token), false).await.unwrap();

        assert_eq!(first, ConfirmationOutcome::Sent);
        assert_eq!(second, ConfirmationOutcome::AlreadySent);
        assert_eq!(email.sent_count(), 1);
        assert_eq!(store.booking(token.as_str()).unwrap().email_status, EmailStatus::Sent);
    }

    #[tokio::test]
    async fn test_resend_delivers_again() {
        let store = InMemoryBookingStore::new();
        let email = MockEmailProvider::new();
        let (_, token) = booked(&store).await;
        let service = service(&store, &email);
        service.send_confirmation(&details(&token), false).await.unwrap();

        let outcome = service.send_confirmation(&details(&token), true).await.unwrap();

        assert_eq!(outcome, ConfirmationOutcome::Sent);
        assert_eq!(email.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_retryable() {
        let store = InMemoryBookingStore::new();
        let email = MockEmailProvider::failing();
        let (slot, token) = booked(&store).await;
        let service = service(&store, &email);

        let failed = service.send_confirmation(&details(&token), false).await;

        assert!(matches!(failed, Err(BookingError::Email(_))));
        assert_eq!(store.booking(token.as_str()).unwrap().email_status, EmailStatus::Failed);
        assert_eq!(store.bookings_for(slot), 1, "Delivery failure keeps the booking");

        email.set_should_succeed(true);
        let retried = service.send_confirmation(&details(&token), false).await.unwrap();

        assert_eq!(retried, ConfirmationOutcome::Sent);
        assert_eq!(email.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_for_unknown_token() {
        let store = InMemoryBookingStore::new();
        let email = MockEmailProvider::new();

        let result = service(&store, &email)
            .send_confirmation(&details(&token(9)), false)
            .await;

        assert!(matches!(result, Err(BookingError::ReservationNotFound)));
        assert_eq!(email.attempts(), 0);
    }

    #[tokio::test]
    async fn test_message_contains_consult_link() {
        let store = InMemoryBookingStore::new();
        let email = MockEmailProvider::new();
        let (_, token) = booked(&store).await;

        service(&store, &email)
            .send_confirmation(&details(&token), false)
            .await
            .unwrap();

        let sent = email.sent_messages();
        assert_eq!(sent[0].to, CUSTOMER_EMAIL);
        assert!(sent[0].html.contains(CONSULT_URL));
        assert!(sent[0].plain_text.contains("December 24 at 9h00"));
    }

    #[tokio::test]
    async fn test_booking_confirmation_uses_long_local_date() {
        let store = InMemoryBookingStore::new();
        let email = MockEmailProvider::new();
        let (_, token) = booked(&store).await;
        let confirmation = BookingConfirmation {
            token,
            email: CUSTOMER_EMAIL.to_string(),
            date: fixtures::christmas_eve(),
            time: "9h00".to_string(),
        };

        service(&store, &email)
            .confirm_booking(&confirmation, Language::French)
            .await
            .unwrap();

        let sent = email.sent_messages();
        assert!(sent[0].plain_text.contains("du mardi 24 décembre 2024 à 9h00"));
        assert!(sent[0].html.contains("date=2024-12-24"));
        assert!(!sent[0].plain_text.contains("2024-12-24"));
    }

    #[tokio::test]
    async fn test_cancel_twice() {
        let store = InMemoryBookingStore::new();
        let email = MockEmailProvider::new();
        let (slot, token) = booked(&store).await;
        let service = service(&store, &email);

        let released = service.cancel(&token).await.unwrap();
        let again = service.cancel(&token).await;

        assert_eq!(released.count, 9);
        assert!(matches!(again, Err(BookingError::ReservationNotFound)));
        assert_eq!(store.slot(slot).unwrap().count, 9);
        assert!(matches!(
            service.verify(&token).await,
            Err(BookingError::ReservationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_cancel_unknown_token_mutates_nothing() {
        let store = InMemoryBookingStore::new();
        let email = MockEmailProvider::new();
        let (slot, _) = booked(&store).await;

        let result = service(&store, &email)
            .cancel(&BookingToken::new("deadbeef"))
            .await;

        assert!(matches!(result, Err(BookingError::ReservationNotFound)));
        assert_eq!(store.slot(slot).unwrap().count, 10);
        assert_eq!(store.booking_count(), 1);
    }
}
