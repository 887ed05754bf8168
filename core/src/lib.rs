//! # Tree-Farm Booking Core
//!
//! Domain types and collaborator traits for the tree-farm reservation service.
//!
//! The booking domain is small: an [`OpenDate`](types::OpenDate) is a day the
//! farm accepts visitors, a [`HalfHour`](types::HalfHour) is a fixed time-of-day
//! period, and a [`Slot`](types::Slot) pairs the two with an occupancy counter.
//! Each successful booking creates one [`Booking`](types::Booking) identified by
//! an opaque [`BookingToken`](types::BookingToken).
//!
//! # Invariants
//!
//! ```text
//! 0 <= slot.count <= SLOT_CAPACITY            (for every slot, at all times)
//! booking created   => slot.count += 1        (one atomic unit with the check)
//! booking cancelled => slot.count -= 1        (one atomic unit with the delete)
//! ```
//!
//! The invariants are enforced by the [`BookingStore`](store::BookingStore)
//! implementation through conditional updates. Services never read a count and
//! write it back.
//!
//! # Modules
//!
//! - [`types`]: identifiers, rows and value objects
//! - [`error`]: error taxonomy shared by stores, services and the HTTP layer
//! - [`environment`]: injectable clock
//! - [`store`]: persistent store abstraction
//! - [`email`]: email delivery abstraction and confirmation message composition
//! - [`token`]: HMAC booking token minting

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod email;
pub mod environment;
pub mod error;
pub mod store;
pub mod token;
pub mod types;

pub use email::{ConfirmationDetails, EmailMessage, EmailProvider};
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, EmailError, StoreError};
pub use store::{BookingStore, EmailClaim};
pub use token::TokenMinter;
pub use types::*;

/// Maximum number of bookings a single half-hour slot accepts.
pub const SLOT_CAPACITY: i32 = 10;

/// Last half-hour id counted as morning in the AM/PM occupancy split.
///
/// Half-hour ids follow time-of-day order; id 7 is `11:30`.
pub const MIDDAY_CUTOFF: i32 = 7;

/// Periods of the farm's day, in half-hour id order (id 1 is `8:30`).
pub const HALF_HOUR_PERIODS: [&str; 13] = [
    "8:30", "9:00", "9:30", "10:00", "10:30", "11:00", "11:30", "13:00", "13:30", "14:00", "14:30",
    "15:00", "15:30",
];
