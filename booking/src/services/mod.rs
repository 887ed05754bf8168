//! Booking services.
//!
//! Services hold the collaborators they need (`Arc<dyn BookingStore>`,
//! `Arc<dyn EmailProvider>`, `Arc<dyn Clock>`) and translate store errors into
//! [`tree_farm_core::BookingError`]. HTTP handlers stay thin:
//!
//! 1. Extract and validate the request
//! 2. Call one service operation
//! 3. Map the result to a response

pub mod availability;
pub mod booking;
pub mod lifecycle;

pub use availability::{AvailabilityService, DateFilter};
pub use booking::BookingService;
pub use lifecycle::{ConfirmationOutcome, LifecycleService};
