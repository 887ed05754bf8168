//! # Tree-Farm Testing
//!
//! Test doubles and fixtures for the tree-farm booking service.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`SteppingClock`])
//! - [`InMemoryBookingStore`]: a row-atomic in-memory `BookingStore`
//! - [`MockEmailProvider`]: records messages, injects failures and latency
//! - Scenario fixtures and proptest strategies
//!
//! ## Example
//!
//! ```
//! use tree_farm_testing::{fixtures, InMemoryBookingStore};
//!
//! let store = InMemoryBookingStore::new();
//! let slot = fixtures::christmas_eve_slot(&store);
//! assert_eq!(store.slot(slot.id).map(|s| s.count), Some(9));
//! ```

mod email_mocks;
pub mod fixtures;
mod store_mocks;

use chrono::{DateTime, Utc};
use tree_farm_core::environment::Clock;

pub use email_mocks::MockEmailProvider;
pub use store_mocks::InMemoryBookingStore;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::Duration;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tree_farm_testing::mocks::FixedClock;
    /// use tree_farm_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that advances by one nanosecond on every reading.
    ///
    /// Gives repeated bookings by the same email distinct tokens while keeping
    /// tests deterministic.
    #[derive(Debug)]
    pub struct SteppingClock {
        start: DateTime<Utc>,
        ticks: AtomicI64,
    }

    impl SteppingClock {
        /// Create a clock starting at `start`.
        #[must_use]
        pub const fn new(start: DateTime<Utc>) -> Self {
            Self {
                start,
                ticks: AtomicI64::new(0),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
            self.start + Duration::nanoseconds(tick)
        }
    }

    /// Create a default fixed clock for tests (2024-12-01 10:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2024-12-01T10:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Strategy producing email addresses that pass basic validation.
    pub fn valid_email() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9]{0,11}", "[a-z]{2,10}", "(com|fr|ca|org)")
            .prop_map(|(local, domain, tld)| format!("{local}@{domain}.{tld}"))
    }

    /// Strategy producing a sequence of booking (`true`) and cancellation
    /// (`false`) attempts.
    pub fn booking_operations(max_len: usize) -> impl Strategy<Value = Vec<bool>> {
        proptest::collection::vec(any::<bool>(), 0..max_len)
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SteppingClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_stepping_clock_is_strictly_increasing() {
        let clock = SteppingClock::new(test_clock().now());
        let first = clock.now();
        let second = clock.now();
        assert!(second > first);
        assert_eq!((second - first).num_nanoseconds(), Some(1));
    }
}
