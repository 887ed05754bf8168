//! Booking token minting.
//!
//! A token is the hex-encoded HMAC-SHA256 of
//! `"{slot_id}-{half_hour_id}-{open_date_id}-{email}-{timestamp}"`, keyed with
//! the application secret. The timestamp has nanosecond resolution so two
//! bookings of the same slot by the same email still get distinct tokens.
//!
//! The key only makes tokens unguessable; tokens are never verified by
//! recomputing the MAC. Lookups go through the store.

use crate::types::{BookingToken, Slot};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub use hmac::digest::InvalidLength;

/// Mints booking tokens with a fixed secret.
#[derive(Clone)]
pub struct TokenMinter {
    mac: HmacSha256,
}

impl TokenMinter {
    /// Create a minter keyed with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLength`] if the key is rejected by the MAC.
    pub fn new(secret: &[u8]) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    /// Mint the token for booking `slot` with contact `email` at `now`.
    #[must_use]
    pub fn mint(&self, slot: &Slot, email: &str, now: DateTime<Utc>) -> BookingToken {
        let timestamp = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));
        let payload = format!(
            "{}-{}-{}-{email}-{timestamp}",
            slot.id, slot.half_hour_id, slot.open_date_id
        );

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        BookingToken::new(hex::encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for TokenMinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMinter").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::types::{HalfHourId, OpenDateId, SlotId};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn slot() -> Slot {
        Slot {
            id: SlotId(10),
            open_date_id: OpenDateId(1),
            half_hour_id: HalfHourId(2),
            count: 9,
        }
    }

    fn minter() -> TokenMinter {
        TokenMinter::new(b"ferme-noel-dantan").unwrap()
    }

    #[test]
    fn test_token_is_64_lowercase_hex() {
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap();
        let token = minter().mint(&slot(), "a@b.com", now);

        assert!(token.is_well_formed());
        assert!(token.as_str().chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_token_is_deterministic_for_same_inputs() {
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap();

        assert_eq!(
            minter().mint(&slot(), "a@b.com", now),
            minter().mint(&slot(), "a@b.com", now)
        );
    }

    #[test]
    fn test_token_depends_on_secret() {
        let now = Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap();
        let other = TokenMinter::new(b"another-secret").unwrap();

        assert_ne!(
            minter().mint(&slot(), "a@b.com", now),
            other.mint(&slot(), "a@b.com", now)
        );
    }

    #[test]
    fn test_token_matches_reference_mac() {
        let now = Utc.timestamp_nanos(1_733_047_200_000_000_123);
        let token = minter().mint(&slot(), "a@b.com", now);

        let mut mac = HmacSha256::new_from_slice(b"ferme-noel-dantan").unwrap();
        mac.update(b"10-2-1-a@b.com-1733047200000000123");
        assert_eq!(token.as_str(), hex::encode(mac.finalize().into_bytes()));
    }

    proptest! {
        #[test]
        fn distinct_timestamps_give_distinct_tokens(offset in 1i64..1_000_000) {
            let now = Utc.with_ymd_and_hms(2024, 12, 1, 10, 0, 0).unwrap();
            let later = now + Duration::nanoseconds(offset);

            prop_assert_ne!(
                minter().mint(&slot(), "a@b.com", now),
                minter().mint(&slot(), "a@b.com", later)
            );
        }
    }
}
