//! Application state for the booking HTTP server.

use crate::config::Config;
use crate::services::{AvailabilityService, BookingService, LifecycleService};
use axum::extract::FromRef;
use std::sync::Arc;
use tree_farm_core::token::InvalidLength;
use tree_farm_core::{BookingStore, Clock, EmailProvider, TokenMinter};

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request. Every service shares the same
/// `Arc<dyn BookingStore>`.
#[derive(Clone)]
pub struct AppState {
    /// Booking store (also used by the readiness probe)
    pub store: Arc<dyn BookingStore>,

    /// Open dates and slots
    pub availability: Arc<AvailabilityService>,

    /// Booking transaction
    pub booking: Arc<BookingService>,

    /// Confirmation and cancellation
    pub lifecycle: Arc<LifecycleService>,

    /// Send the confirmation email right after booking
    pub auto_confirm: bool,
}

impl AppState {
    /// Wire the services over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLength`] if the token secret cannot key the HMAC.
    pub fn new(
        store: Arc<dyn BookingStore>,
        email: Arc<dyn EmailProvider>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Result<Self, InvalidLength> {
        let minter = TokenMinter::new(config.booking.token_secret.as_bytes())?;

        Ok(Self {
            availability: Arc::new(AvailabilityService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
            )),
            booking: Arc::new(BookingService::new(Arc::clone(&store), clock, minter)),
            lifecycle: Arc::new(LifecycleService::new(
                Arc::clone(&store),
                email,
                config.email.consult_url.clone(),
            )),
            store,
            auto_confirm: config.booking.auto_confirm,
        })
    }
}

// Lets the shared readiness handler extract the store from AppState
impl FromRef<AppState> for Arc<dyn BookingStore> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.store)
    }
}
