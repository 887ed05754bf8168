//! In-memory booking store.
//!
//! Every operation runs under a single mutex, which gives the same guarantees
//! as the row locks and transactions of the PostgreSQL store: the capacity
//! check and the increment of [`BookingStore::reserve_slot`] cannot
//! interleave with another booking.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned mutex

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tree_farm_core::store::{BookingStore, EmailClaim, StoreFuture};
use tree_farm_core::{
    AvailableSlot, Booking, BookingId, BookingToken, DateRange, EmailStatus, HALF_HOUR_PERIODS,
    HalfHour, HalfHourId, OpenDate, OpenDateId, OpenDateSummary, SLOT_CAPACITY, Slot, SlotDetails,
    SlotId, StoreError,
};

#[derive(Debug, Default)]
struct State {
    half_hours: BTreeMap<HalfHourId, HalfHour>,
    open_dates: BTreeMap<OpenDateId, OpenDate>,
    slots: BTreeMap<SlotId, Slot>,
    bookings: HashMap<String, Booking>,
    next_booking_id: i32,
    unavailable: bool,
}

impl State {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Database("in-memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn next_open_date_id(&self) -> OpenDateId {
        OpenDateId(self.open_dates.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    fn next_slot_id(&self) -> SlotId {
        SlotId(self.slots.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    fn slots_of(&self, date: OpenDateId) -> impl Iterator<Item = &Slot> {
        self.slots.values().filter(move |slot| slot.open_date_id == date)
    }
}

/// In-memory [`BookingStore`] for fast, deterministic tests.
///
/// Seeded with the thirteen half-hours of the farm's day. Clones share state.
///
/// # Example
///
/// ```
/// use tree_farm_testing::InMemoryBookingStore;
/// use tree_farm_core::store::BookingStore;
/// use chrono::NaiveDate;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryBookingStore::new();
/// let date = store.open_date(NaiveDate::from_ymd_opt(2024, 12, 24).unwrap()).await?;
/// assert_eq!(store.list_available_slots(date.id).await?.len(), 13);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryBookingStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryBookingStore {
    /// Create a store with the standard half-hours and no open dates.
    #[must_use]
    pub fn new() -> Self {
        let half_hours = HALF_HOUR_PERIODS
            .iter()
            .zip(1..)
            .map(|(period, id)| {
                (
                    HalfHourId(id),
                    HalfHour {
                        id: HalfHourId(id),
                        period: (*period).to_string(),
                    },
                )
            })
            .collect();

        Self {
            state: Arc::new(Mutex::new(State {
                half_hours,
                next_booking_id: 1,
                ..State::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Insert an open date with an explicit id (fixtures).
    pub fn insert_open_date(&self, open_date: OpenDate) {
        self.lock().open_dates.insert(open_date.id, open_date);
    }

    /// Insert a slot with an explicit id and count (fixtures).
    pub fn insert_slot(&self, slot: Slot) {
        self.lock().slots.insert(slot.id, slot);
    }

    /// Current state of a slot.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<Slot> {
        self.lock().slots.get(&id).cloned()
    }

    /// Current state of a booking.
    #[must_use]
    pub fn booking(&self, token: &str) -> Option<Booking> {
        self.lock().bookings.get(token).cloned()
    }

    /// Number of bookings across all slots.
    #[must_use]
    pub fn booking_count(&self) -> usize {
        self.lock().bookings.len()
    }

    /// Number of bookings recorded for one slot.
    #[must_use]
    pub fn bookings_for(&self, slot: SlotId) -> usize {
        self.lock()
            .bookings
            .values()
            .filter(|booking| booking.slot_id == slot)
            .count()
    }

    /// Make every subsequent operation fail with [`StoreError::Database`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingStore for InMemoryBookingStore {
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.lock().check_available() })
    }

    fn open_date(&self, date: NaiveDate) -> StoreFuture<'_, OpenDate> {
        Box::pin(async move {
            let mut state = self.lock();
            state.check_available()?;

            let open_date = if let Some(existing) = state.open_dates.values().find(|d| d.date == date) {
                existing.clone()
            } else {
                let open_date = OpenDate {
                    id: state.next_open_date_id(),
                    date,
                };
                state.open_dates.insert(open_date.id, open_date.clone());
                open_date
            };

            let half_hour_ids: Vec<HalfHourId> = state.half_hours.keys().copied().collect();
            for half_hour_id in half_hour_ids {
                let exists = state
                    .slots_of(open_date.id)
                    .any(|slot| slot.half_hour_id == half_hour_id);
                if !exists {
                    let slot = Slot {
                        id: state.next_slot_id(),
                        open_date_id: open_date.id,
                        half_hour_id,
                        count: 0,
                    };
                    state.slots.insert(slot.id, slot);
                }
            }

            Ok(open_date)
        })
    }

    fn list_half_hours(&self) -> StoreFuture<'_, Vec<HalfHour>> {
        Box::pin(async move {
            let state = self.lock();
            state.check_available()?;
            Ok(state.half_hours.values().cloned().collect())
        })
    }

    fn list_open_dates(&self, range: DateRange) -> StoreFuture<'_, Vec<OpenDateSummary>> {
        Box::pin(async move {
            let state = self.lock();
            state.check_available()?;

            let mut summaries: Vec<OpenDateSummary> = state
                .open_dates
                .values()
                .filter(|open_date| range.contains(open_date.date))
                .filter(|open_date| state.slots_of(open_date.id).any(|slot| !slot.is_full()))
                .map(|open_date| {
                    let (total_am, total_pm) =
                        state
                            .slots_of(open_date.id)
                            .fold((0_i64, 0_i64), |(am, pm), slot| {
                                if slot.half_hour_id.is_morning() {
                                    (am + i64::from(slot.count), pm)
                                } else {
                                    (am, pm + i64::from(slot.count))
                                }
                            });
                    OpenDateSummary {
                        id: open_date.id,
                        date: open_date.date,
                        total_am,
                        total_pm,
                    }
                })
                .collect();

            summaries.sort_by_key(|summary| (summary.date, summary.id));
            Ok(summaries)
        })
    }

    fn find_open_date(&self, id: OpenDateId) -> StoreFuture<'_, Option<OpenDate>> {
        Box::pin(async move {
            let state = self.lock();
            state.check_available()?;
            Ok(state.open_dates.get(&id).cloned())
        })
    }

    fn list_available_slots(&self, id: OpenDateId) -> StoreFuture<'_, Vec<AvailableSlot>> {
        Box::pin(async move {
            let state = self.lock();
            state.check_available()?;

            let mut slots: Vec<AvailableSlot> = state
                .slots_of(id)
                .filter(|slot| slot.count < SLOT_CAPACITY)
                .filter_map(|slot| {
                    state
                        .half_hours
                        .get(&slot.half_hour_id)
                        .map(|half_hour| AvailableSlot {
                            slot: slot.clone(),
                            half_hour: half_hour.clone(),
                        })
                })
                .collect();

            slots.sort_by_key(|available| (available.half_hour.id, available.slot.id));
            Ok(slots)
        })
    }

    fn list_slots(&self) -> StoreFuture<'_, Vec<Slot>> {
        Box::pin(async move {
            let state = self.lock();
            state.check_available()?;
            Ok(state.slots.values().cloned().collect())
        })
    }

    fn find_slot(&self, id: SlotId) -> StoreFuture<'_, Option<SlotDetails>> {
        Box::pin(async move {
            let state = self.lock();
            state.check_available()?;

            let Some(slot) = state.slots.get(&id) else {
                return Ok(None);
            };
            let open_date = state.open_dates.get(&slot.open_date_id);
            let half_hour = state.half_hours.get(&slot.half_hour_id);

            Ok(open_date.zip(half_hour).map(|(open_date, half_hour)| SlotDetails {
                slot: slot.clone(),
                open_date: open_date.clone(),
                half_hour: half_hour.clone(),
            }))
        })
    }

    fn token_exists<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let state = self.lock();
            state.check_available()?;
            Ok(state.bookings.contains_key(token.as_str()))
        })
    }

    fn reserve_slot<'a>(&'a self, slot: SlotId, token: &'a BookingToken) -> StoreFuture<'a, Slot> {
        Box::pin(async move {
            let mut state = self.lock();
            state.check_available()?;

            let current = state
                .slots
                .get(&slot)
                .cloned()
                .ok_or(StoreError::SlotNotFound(slot))?;
            if current.count >= SLOT_CAPACITY {
                return Err(StoreError::SlotFull(slot));
            }
            if state.bookings.contains_key(token.as_str()) {
                return Err(StoreError::DuplicateToken);
            }

            let booking = Booking {
                id: BookingId(state.next_booking_id),
                token: token.clone(),
                slot_id: slot,
                email_status: EmailStatus::Pending,
            };
            state.next_booking_id += 1;
            state.bookings.insert(token.as_str().to_string(), booking);

            let updated = Slot {
                count: current.count + 1,
                ..current
            };
            state.slots.insert(slot, updated.clone());
            Ok(updated)
        })
    }

    fn find_booking<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, Option<Booking>> {
        Box::pin(async move {
            let state = self.lock();
            state.check_available()?;
            Ok(state.bookings.get(token.as_str()).cloned())
        })
    }

    fn claim_email_delivery<'a>(
        &'a self,
        token: &'a BookingToken,
        resend: bool,
    ) -> StoreFuture<'a, EmailClaim> {
        Box::pin(async move {
            let mut state = self.lock();
            state.check_available()?;

            let booking = state
                .bookings
                .get_mut(token.as_str())
                .ok_or(StoreError::BookingNotFound)?;
            let previous = booking.email_status;
            if previous.is_sent() && !resend {
                return Ok(EmailClaim::AlreadySent);
            }
            booking.email_status = EmailStatus::Sent;
            Ok(EmailClaim::Claimed { previous })
        })
    }

    fn record_email_status<'a>(
        &'a self,
        token: &'a BookingToken,
        status: EmailStatus,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.check_available()?;

            let booking = state
                .bookings
                .get_mut(token.as_str())
                .ok_or(StoreError::BookingNotFound)?;
            booking.email_status = status;
            Ok(())
        })
    }

    fn cancel_booking<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, Slot> {
        Box::pin(async move {
            let mut state = self.lock();
            state.check_available()?;

            let booking = state
                .bookings
                .remove(token.as_str())
                .ok_or(StoreError::BookingNotFound)?;
            let slot = state
                .slots
                .get_mut(&booking.slot_id)
                .ok_or(StoreError::SlotNotFound(booking.slot_id))?;
            if slot.count > 0 {
                slot.count -= 1;
            }
            Ok(slot.clone())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn christmas_eve() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 24).unwrap()
    }

    #[tokio::test]
    async fn test_open_date_is_idempotent() {
        let store = InMemoryBookingStore::new();

        let first = store.open_date(christmas_eve()).await.unwrap();
        let second = store.open_date(christmas_eve()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_slots().await.unwrap().len(), HALF_HOUR_PERIODS.len());
    }

    #[tokio::test]
    async fn test_cancel_leaves_slot_missing_booking_untouched() {
        let store = InMemoryBookingStore::new();
        store.open_date(christmas_eve()).await.unwrap();

        let result = store.cancel_booking(&BookingToken::new("deadbeef")).await;

        assert_eq!(result, Err(StoreError::BookingNotFound));
        assert!(store.list_slots().await.unwrap().iter().all(|s| s.count == 0));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = InMemoryBookingStore::new();
        store.set_unavailable(true);

        assert!(matches!(store.ping().await, Err(StoreError::Database(_))));
        assert!(matches!(store.list_slots().await, Err(StoreError::Database(_))));
    }
}
