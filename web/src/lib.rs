//! Axum integration for the tree-farm booking service.
//!
//! This crate holds the HTTP plumbing that is independent of any single
//! endpoint:
//!
//! - [`AppError`]: maps [`tree_farm_core::BookingError`] to status codes and
//!   the `{"error": code, "message": ...}` body
//! - [`extractors`]: JSON and query extractors that reject with `invalidBody`
//! - [`middleware`]: correlation IDs and request spans
//! - [`handlers`]: liveness and readiness endpoints
//!
//! # Example
//!
//! ```ignore
//! use tree_farm_web::{AppError, extractors::JsonBody};
//! use axum::{Router, routing::post, Json};
//!
//! async fn create_reservation(
//!     State(state): State<AppState>,
//!     JsonBody(request): JsonBody<CreateReservationRequest>,
//! ) -> Result<Json<ReservationResponse>, AppError> {
//!     let confirmation = state.booking.book(request.id, &request.email).await?;
//!     Ok(Json(confirmation.into()))
//! }
//!
//! let app = Router::new()
//!     .route("/api/reservations", post(create_reservation))
//!     .with_state(app_state);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::{AppError, ErrorResponse};
pub use extractors::{CorrelationId, JsonBody, QueryParams};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
