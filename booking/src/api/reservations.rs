//! Slot queries and the booking endpoint.
//!
//! - GET /api/reservations - Every slot
//! - GET /api/reservations-by-date?dateId= - Bookable slots of one date
//! - POST /api/reservations-by-date - Book a slot

use crate::server::state::AppState;
use axum::{Json, extract::State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tree_farm_core::{
    AvailableSlot, BookingConfirmation, BookingError, HalfHourId, Language, OpenDateId, Slot,
    SlotId,
};
use tree_farm_web::{AppError, CorrelationId, JsonBody, QueryParams};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters of `GET /api/reservations-by-date`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationsByDateQuery {
    /// Open date id
    pub date_id: Option<String>,
}

/// Half-hour label nested in slot responses.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HalfHourResponse {
    /// Half-hour id
    pub id: HalfHourId,
    /// Display period (`9:00`)
    pub period: String,
}

/// A bookable slot with its half-hour.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    /// Slot id (`reservationId` when booking)
    pub id: SlotId,
    /// Owning open date
    pub open_date_id: OpenDateId,
    /// Half-hour id
    pub half_hour_id: HalfHourId,
    /// Current bookings
    pub count: i32,
    /// Half-hour label
    pub half_hour: HalfHourResponse,
}

impl From<AvailableSlot> for SlotResponse {
    fn from(available: AvailableSlot) -> Self {
        Self {
            id: available.slot.id,
            open_date_id: available.slot.open_date_id,
            half_hour_id: available.slot.half_hour_id,
            count: available.slot.count,
            half_hour: HalfHourResponse {
                id: available.half_hour.id,
                period: available.half_hour.period,
            },
        }
    }
}

/// Body of `POST /api/reservations-by-date`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    /// Slot to book
    pub reservation_id: SlotId,
    /// Contact email
    pub email: String,
    /// `fr` for French confirmations
    pub language: Option<String>,
}

/// A successful booking.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationResponse {
    /// Booking token
    pub hash: String,
    /// Contact email
    pub email: String,
    /// Booked date
    pub date: NaiveDate,
    /// Display time (`9h00`)
    pub time: String,
}

impl From<BookingConfirmation> for ReservationResponse {
    fn from(confirmation: BookingConfirmation) -> Self {
        Self {
            hash: confirmation.token.to_string(),
            email: confirmation.email,
            date: confirmation.date,
            time: confirmation.time,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List every slot, full or not.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/reservations
/// ```
pub async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Slot>>, AppError> {
    Ok(Json(state.availability.list_slots().await?))
}

/// List the bookable slots of one open date.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/reservations-by-date?dateId=1"
/// ```
///
/// Response:
/// ```json
/// [
///   {
///     "id": 10,
///     "openDateId": 1,
///     "halfHourId": 2,
///     "count": 9,
///     "halfHour": { "id": 2, "period": "9:00" }
///   }
/// ]
/// ```
pub async fn reservations_by_date(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ReservationsByDateQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let date_id: OpenDateId = query
        .date_id
        .as_deref()
        .ok_or_else(|| BookingError::InvalidDateId("missing".to_string()))?
        .parse()?;

    let slots = state.availability.slots_for_date(date_id).await?;

    Ok(Json(slots.into_iter().map(SlotResponse::from).collect()))
}

/// Book one place in a slot.
///
/// When auto-confirmation is enabled the confirmation email is sent before
/// responding; a delivery failure is logged and the booking still succeeds.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/reservations-by-date \
///   -H "Content-Type: application/json" \
///   -d '{"reservationId": 10, "email": "a@b.com", "language": "fr"}'
/// ```
///
/// Response:
/// ```json
/// {
///   "hash": "5d0c2b1f...",
///   "email": "a@b.com",
///   "date": "2024-12-24",
///   "time": "9h00"
/// }
/// ```
pub async fn create_reservation(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    JsonBody(request): JsonBody<CreateReservationRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let confirmation = state
        .booking
        .book(request.reservation_id, request.email.trim())
        .await?;

    if state.auto_confirm {
        let language = Language::from_tag(request.language.as_deref());
        if let Err(error) = state.lifecycle.confirm_booking(&confirmation, language).await {
            tracing::warn!(
                correlation_id = %correlation_id,
                error = %error,
                "Automatic confirmation failed; booking kept"
            );
        }
    }

    Ok(Json(ReservationResponse::from(confirmation)))
}
