//! Injectable dependencies that are not storage or delivery.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// Token minting reads the clock for its timestamp component and the
/// availability query uses it to resolve `upcoming=true`.
///
/// # Examples
///
/// ```
/// use tree_farm_core::environment::{Clock, SystemClock};
///
/// let now = SystemClock.now();
/// assert!(now.timestamp() > 0);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
