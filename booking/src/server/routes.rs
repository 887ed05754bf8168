//! Router configuration for the booking service.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{cancellation, confirmation, open_dates, reservations};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tree_farm_web::correlation_id_layer;
use tree_farm_web::handlers::{health_check, readiness_check};

/// Build the complete Axum router.
///
/// Configures:
/// - Health checks (`/health`, `/ready`)
/// - Availability queries
/// - Booking, verification, cancellation and confirmation endpoints
///
/// Every response carries an `X-Correlation-ID` header.
pub fn build_router(state: AppState) -> Router {
    // API routes
    let api_routes = Router::new()
        // Availability
        .route("/open-dates", get(open_dates::list_open_dates))
        .route("/reservations", get(reservations::list_reservations))
        .route(
            "/reservations-by-date",
            get(reservations::reservations_by_date).post(reservations::create_reservation),
        )
        // Lifecycle
        .route(
            "/cancel-reservation",
            get(cancellation::verify_reservation)
                .post(cancellation::cancel_reservation)
                .delete(cancellation::cancel_reservation),
        )
        .route("/confirmation-email", post(confirmation::send_confirmation_email));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(correlation_id_layer())
        .with_state(state)
}
