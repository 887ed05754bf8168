//! Confirmation email endpoint.
//!
//! - POST /api/confirmation-email - Send or resend the confirmation

use crate::server::state::AppState;
use crate::services::lifecycle::require_token;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tree_farm_core::{BookingError, ConfirmationDetails, Language, is_valid_email};
use tree_farm_web::{AppError, JsonBody};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /api/confirmation-email`.
///
/// `date` and `time` are shown as-is in the message; `rawDate` goes into the
/// consult link and defaults to `date`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    /// Booking token
    pub hash: Option<String>,
    /// Recipient
    pub email: String,
    /// Display date
    pub date: String,
    /// Display time
    pub time: String,
    /// `fr` for French
    pub language: Option<String>,
    /// Machine-readable date for the consult link
    pub raw_date: Option<String>,
    /// Deliver even if already sent
    #[serde(default)]
    pub resend: bool,
}

impl TryFrom<ConfirmationRequest> for ConfirmationDetails {
    type Error = BookingError;

    fn try_from(request: ConfirmationRequest) -> Result<Self, Self::Error> {
        let token = require_token(request.hash.as_deref())?;
        if !is_valid_email(&request.email) {
            return Err(BookingError::InvalidBody(format!(
                "Invalid email address: {}",
                request.email
            )));
        }

        Ok(Self {
            token,
            language: Language::from_tag(request.language.as_deref()),
            raw_date: request.raw_date.unwrap_or_else(|| request.date.clone()),
            email: request.email,
            date: request.date,
            time: request.time,
        })
    }
}

/// `{ "message": "emailSent" | "emailAlreadySent" }`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationResponse {
    /// Outcome
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Send the confirmation email of a booking.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/confirmation-email \
///   -H "Content-Type: application/json" \
///   -d '{"hash": "5d0c2b1f...", "email": "a@b.com", "date": "24 décembre", "time": "9h00", "language": "fr", "rawDate": "2024-12-24"}'
/// ```
///
/// Response:
/// ```json
/// { "message": "emailSent" }
/// ```
pub async fn send_confirmation_email(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ConfirmationRequest>,
) -> Result<Json<ConfirmationResponse>, AppError> {
    let resend = request.resend;
    let details = ConfirmationDetails::try_from(request)?;

    let outcome = state.lifecycle.send_confirmation(&details, resend).await?;

    Ok(Json(ConfirmationResponse {
        message: outcome.message().to_string(),
    }))
}
