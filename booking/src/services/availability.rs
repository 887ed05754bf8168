//! Availability queries: open dates and their bookable slots.

use chrono::NaiveDate;
use std::sync::Arc;
use tree_farm_core::{
    AvailableSlot, BookingError, BookingStore, Clock, DateRange, OpenDateId, OpenDateSummary, Slot,
};

/// Date filter as requested by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateFilter {
    /// Earliest date (inclusive)
    pub from: Option<NaiveDate>,
    /// Latest date (inclusive)
    pub to: Option<NaiveDate>,
    /// Use today as the lower bound when `from` is absent
    pub upcoming: bool,
}

impl DateFilter {
    /// Resolve the filter against `today`.
    ///
    /// Returns `None` when `upcoming` raises the lower bound past `to`, so no
    /// date can match.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidDateRange`] when an explicit `from` is after `to`.
    pub fn resolve(self, today: NaiveDate) -> Result<Option<DateRange>, BookingError> {
        match (self.from, self.upcoming) {
            (Some(from), _) => DateRange::new(Some(from), self.to).map(Some),
            (None, true) if self.to.is_some_and(|to| to < today) => Ok(None),
            (None, true) => DateRange::new(Some(today), self.to).map(Some),
            (None, false) => DateRange::new(None, self.to).map(Some),
        }
    }
}

/// Read-only queries over open dates and slots.
pub struct AvailabilityService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    /// Create a new availability service.
    #[must_use]
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Open dates with at least one bookable slot, ordered by date, with
    /// their AM/PM occupancy totals.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidDateRange`] for inverted bounds, or
    /// [`BookingError::Store`] if the store fails.
    pub async fn list_open_dates(
        &self,
        filter: DateFilter,
    ) -> Result<Vec<OpenDateSummary>, BookingError> {
        let Some(range) = filter.resolve(self.clock.now().date_naive())? else {
            tracing::debug!(?filter, "Date filter excludes every date");
            return Ok(Vec::new());
        };
        let dates = self.store.list_open_dates(range).await?;
        tracing::debug!(count = dates.len(), ?range, "Listed open dates");
        Ok(dates)
    }

    /// Bookable slots of one open date, ordered by half-hour.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DateNotFound`] if the date does not exist, or
    /// [`BookingError::Store`] if the store fails.
    pub async fn slots_for_date(
        &self,
        date_id: OpenDateId,
    ) -> Result<Vec<AvailableSlot>, BookingError> {
        if self.store.find_open_date(date_id).await?.is_none() {
            return Err(BookingError::DateNotFound(date_id));
        }
        Ok(self.store.list_available_slots(date_id).await?)
    }

    /// Every slot, full or not.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] if the store fails.
    pub async fn list_slots(&self) -> Result<Vec<Slot>, BookingError> {
        Ok(self.store.list_slots().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use tree_farm_testing::{InMemoryBookingStore, fixtures, mocks::FixedClock, test_clock};

    fn service(store: &InMemoryBookingStore) -> AvailabilityService {
        AvailabilityService::new(Arc::new(store.clone()), Arc::new(test_clock()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filter_resolution() {
        let today = date(2024, 12, 1);

        let upcoming = DateFilter { upcoming: true, ..DateFilter::default() };
        assert_eq!(upcoming.resolve(today).unwrap().unwrap().from, Some(today));

        let explicit = DateFilter {
            from: Some(date(2024, 12, 20)),
            upcoming: true,
            ..DateFilter::default()
        };
        assert_eq!(
            explicit.resolve(today).unwrap().unwrap().from,
            Some(date(2024, 12, 20))
        );

        let inverted = DateFilter {
            from: Some(date(2024, 12, 25)),
            to: Some(date(2024, 12, 20)),
            upcoming: false,
        };
        assert!(matches!(
            inverted.resolve(today),
            Err(BookingError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_upcoming_past_the_upper_bound_matches_nothing() {
        let today = date(2024, 12, 21);
        let filter = DateFilter {
            to: Some(date(2024, 12, 20)),
            upcoming: true,
            ..DateFilter::default()
        };

        assert_eq!(filter.resolve(today).unwrap(), None);
    }

    #[tokio::test]
    async fn test_upcoming_with_past_upper_bound_lists_nothing() {
        let store = InMemoryBookingStore::new();
        fixtures::open_date(&store, 1, date(2024, 11, 20));
        fixtures::slot(&store, 1, OpenDateId(1), 1, 0);

        let dates = service(&store)
            .list_open_dates(DateFilter {
                to: Some(date(2024, 11, 25)),
                upcoming: true,
                ..DateFilter::default()
            })
            .await
            .unwrap();

        assert!(dates.is_empty());
    }

    #[tokio::test]
    async fn test_full_dates_are_hidden() {
        let store = InMemoryBookingStore::new();
        fixtures::christmas_eve_slot(&store);
        fixtures::fully_booked_date(&store, 2, date(2024, 12, 23));

        let dates = service(&store)
            .list_open_dates(DateFilter::default())
            .await
            .unwrap();

        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].date, fixtures::christmas_eve());
        assert_eq!(dates[0].total_am, 9);
    }

    #[tokio::test]
    async fn test_upcoming_uses_clock() {
        let store = InMemoryBookingStore::new();
        fixtures::open_date(&store, 1, date(2024, 12, 20));
        fixtures::slot(&store, 1, OpenDateId(1), 1, 0);
        fixtures::christmas_eve_slot(&store);
        let clock = FixedClock::new(
            date(2024, 12, 21).and_hms_opt(9, 0, 0).unwrap().and_utc(),
        );
        let service = AvailabilityService::new(Arc::new(store.clone()), Arc::new(clock));

        let dates = service
            .list_open_dates(DateFilter { upcoming: true, ..DateFilter::default() })
            .await
            .unwrap();

        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].date, fixtures::christmas_eve());
    }

    #[tokio::test]
    async fn test_slots_for_unknown_date() {
        let store = InMemoryBookingStore::new();

        let result = service(&store).slots_for_date(OpenDateId(42)).await;

        assert!(matches!(result, Err(BookingError::DateNotFound(OpenDateId(42)))));
    }

    #[tokio::test]
    async fn test_slots_for_date_excludes_full_slots() {
        let store = InMemoryBookingStore::new();
        let slot = fixtures::christmas_eve_slot(&store);
        fixtures::slot(&store, 11, slot.open_date_id, 3, 10);

        let slots = service(&store).slots_for_date(slot.open_date_id).await.unwrap();

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].slot.id, slot.id);
        assert_eq!(slots[0].half_hour.period, "9:00");
    }
}
