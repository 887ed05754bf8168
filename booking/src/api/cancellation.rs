//! Token verification and cancellation.
//!
//! - GET /api/cancel-reservation?hash= - Check a token
//! - POST | DELETE /api/cancel-reservation - Cancel the booking

use crate::server::state::AppState;
use crate::services::lifecycle::require_token;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tree_farm_web::{AppError, JsonBody, QueryParams};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Token carried as query string or body.
#[derive(Debug, Default, Deserialize)]
pub struct HashParams {
    /// Booking token
    pub hash: Option<String>,
}

/// `{ "success": true }`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessResponse {
    /// Always `true`; failures use the error body
    pub success: bool,
}

impl SuccessResponse {
    const OK: Self = Self { success: true };
}

// ============================================================================
// Handlers
// ============================================================================

/// Check that a token identifies a live booking.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/cancel-reservation?hash=5d0c2b1f..."
/// ```
pub async fn verify_reservation(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<HashParams>,
) -> Result<Json<SuccessResponse>, AppError> {
    let token = require_token(params.hash.as_deref())?;
    state.lifecycle.verify(&token).await?;
    Ok(Json(SuccessResponse::OK))
}

/// Cancel a booking and release its place.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/cancel-reservation \
///   -H "Content-Type: application/json" \
///   -d '{"hash": "5d0c2b1f..."}'
/// ```
pub async fn cancel_reservation(
    State(state): State<AppState>,
    JsonBody(params): JsonBody<HashParams>,
) -> Result<Json<SuccessResponse>, AppError> {
    let token = require_token(params.hash.as_deref())?;
    state.lifecycle.cancel(&token).await?;
    Ok(Json(SuccessResponse::OK))
}
