//! Scenario fixtures.

use crate::InMemoryBookingStore;
use chrono::NaiveDate;
use tree_farm_core::{HalfHourId, OpenDate, OpenDateId, SLOT_CAPACITY, Slot, SlotId};

/// Email used by fixtures and scenario tests.
pub const CUSTOMER_EMAIL: &str = "a@b.com";

/// 2024-12-24.
#[must_use]
pub fn christmas_eve() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 24).unwrap_or_default()
}

/// Insert an open date with an explicit id.
pub fn open_date(store: &InMemoryBookingStore, id: i32, date: NaiveDate) -> OpenDate {
    let open_date = OpenDate {
        id: OpenDateId(id),
        date,
    };
    store.insert_open_date(open_date.clone());
    open_date
}

/// Insert a slot with an explicit id and count.
pub fn slot(
    store: &InMemoryBookingStore,
    id: i32,
    open_date: OpenDateId,
    half_hour: i32,
    count: i32,
) -> Slot {
    let slot = Slot {
        id: SlotId(id),
        open_date_id: open_date,
        half_hour_id: HalfHourId(half_hour),
        count,
    };
    store.insert_slot(slot.clone());
    slot
}

/// `OpenDate(1, 2024-12-24)` with slot 10 at `9:00` holding 9 of 10 bookings.
pub fn christmas_eve_slot(store: &InMemoryBookingStore) -> Slot {
    let date = open_date(store, 1, christmas_eve());
    slot(store, 10, date.id, 2, SLOT_CAPACITY - 1)
}

/// An open date whose every slot is at capacity.
pub fn fully_booked_date(store: &InMemoryBookingStore, id: i32, date: NaiveDate) -> OpenDate {
    let open_date = open_date(store, id, date);
    for half_hour in 1..=2 {
        slot(store, id * 100 + half_hour, open_date.id, half_hour, SLOT_CAPACITY);
    }
    open_date
}
