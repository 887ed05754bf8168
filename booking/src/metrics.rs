//! Business metrics for the booking service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `tree_farm_bookings_total{outcome}` - Booking attempts by outcome
//! - `tree_farm_cancellations_total{outcome}` - Cancellation attempts by outcome
//! - `tree_farm_confirmation_emails_total{outcome}` - Confirmation sends by outcome
//!
//! The Prometheus exporter is installed by the `server` binary; without an
//! installed recorder the recording functions are no-ops.

use metrics::describe_counter;
use tree_farm_core::BookingError;

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "tree_farm_bookings_total",
        "Total number of booking attempts by outcome (booked, full, not_found, invalid, error)"
    );
    describe_counter!(
        "tree_farm_cancellations_total",
        "Total number of cancellation attempts by outcome (canceled, not_found, error)"
    );
    describe_counter!(
        "tree_farm_confirmation_emails_total",
        "Total number of confirmation sends by outcome (sent, already_sent, failed)"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record the outcome of a booking attempt.
///
/// Slots found full by the store's conditional update land in the `full`
/// outcome too.
pub fn record_booking(result: Result<(), &BookingError>) {
    let outcome = booking_outcome(result);
    metrics::counter!("tree_farm_bookings_total", "outcome" => outcome).increment(1);
    tracing::debug!(outcome, "Recorded booking metric");
}

/// Record the outcome of a cancellation attempt.
pub fn record_cancellation(result: Result<(), &BookingError>) {
    let outcome = cancellation_outcome(result);
    metrics::counter!("tree_farm_cancellations_total", "outcome" => outcome).increment(1);
    tracing::debug!(outcome, "Recorded cancellation metric");
}

const fn booking_outcome(result: Result<(), &BookingError>) -> &'static str {
    match result {
        Ok(()) => "booked",
        Err(BookingError::ReservationIsFull) => "full",
        Err(BookingError::ReservationNotFound) => "not_found",
        Err(error) if error.is_internal() => "error",
        Err(_) => "invalid",
    }
}

const fn cancellation_outcome(result: Result<(), &BookingError>) -> &'static str {
    match result {
        Ok(()) => "canceled",
        Err(BookingError::ReservationNotFound) => "not_found",
        Err(_) => "error",
    }
}

/// Record the outcome of a confirmation send.
pub fn record_confirmation_email(outcome: &'static str) {
    metrics::counter!("tree_farm_confirmation_emails_total", "outcome" => outcome).increment(1);
    tracing::debug!(outcome, "Recorded confirmation email metric");
}
