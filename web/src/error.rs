//! Error types for web handlers.
//!
//! [`AppError`] bridges booking errors and HTTP responses. Every error is
//! serialized as
//!
//! ```json
//! { "error": "reservationNotFound", "message": "Reservation not found" }
//! ```
//!
//! where `error` is the stable machine-readable code clients switch on.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tree_farm_core::BookingError;

/// Application error type for web handlers.
///
/// Implements Axum's `IntoResponse`. Server errors are logged with their
/// internal source; the source is never exposed to the client.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Data>, AppError> {
///     let data = state.availability.list_slots().await?;
///     Ok(Json(data))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error with the given code.
    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// Create a 400 `invalidBody` error.
    #[must_use]
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::bad_request("invalidBody", message)
    }

    /// Create a 404 Not Found error with the given code.
    #[must_use]
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    /// Create a 500 Internal Server Error with the given code.
    #[must_use]
    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "serviceUnavailable", message)
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error code (for client error handling).
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            error: self.code.to_string(),
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map booking errors to status codes and wire codes.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let code = err.code();
        match err {
            BookingError::InvalidBody(_)
            | BookingError::InvalidDateId(_)
            | BookingError::InvalidDateRange { .. }
            | BookingError::HashMissing
            | BookingError::ReservationIsFull => Self::bad_request(code, err.to_string()),
            BookingError::DateNotFound(_) | BookingError::ReservationNotFound => {
                Self::not_found(code, err.to_string())
            }
            BookingError::Email(_) => {
                Self::internal(code, "Failed to send confirmation email").with_source(err.into())
            }
            BookingError::TokenCollision | BookingError::Store(_) => {
                Self::internal(code, "An internal error occurred").with_source(err.into())
            }
        }
    }
}

/// Malformed or incomplete JSON bodies.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_body(rejection.body_text())
    }
}

/// Query strings that do not deserialize.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_body(rejection.body_text())
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("unknownError", "An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use tree_farm_core::{EmailError, StoreError};

    #[test]
    fn test_error_display() {
        let err = AppError::invalid_body("Missing field `email`");
        assert_eq!(err.to_string(), "[invalidBody] Missing field `email`");
    }

    #[test]
    fn test_booking_error_statuses() {
        let cases = [
            (BookingError::HashMissing, StatusCode::BAD_REQUEST, "hashMissing"),
            (BookingError::ReservationIsFull, StatusCode::BAD_REQUEST, "reservationIsFull"),
            (BookingError::ReservationNotFound, StatusCode::NOT_FOUND, "reservationNotFound"),
            (
                BookingError::InvalidDateId("abc".into()),
                StatusCode::BAD_REQUEST,
                "invalidDateId",
            ),
            (
                BookingError::Email(EmailError::Delivery("relay down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "emailError",
            ),
            (BookingError::TokenCollision, StatusCode::INTERNAL_SERVER_ERROR, "unknownError"),
        ];

        for (error, status, code) in cases {
            let app_error = AppError::from(error);
            assert_eq!(app_error.status(), status);
            assert_eq!(app_error.code(), code);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::from(BookingError::Store(StoreError::Database(
            "password authentication failed for user postgres".into(),
        )));

        assert_eq!(err.to_string(), "[unknownError] An internal error occurred");
        assert!(std::error::Error::source(&err).is_some());
    }
}
