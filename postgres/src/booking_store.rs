//! `PostgreSQL` implementation of [`BookingStore`].

use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tree_farm_core::store::{BookingStore, EmailClaim, StoreFuture};
use tree_farm_core::{
    AvailableSlot, Booking, BookingId, BookingToken, DateRange, EmailStatus, HalfHour, HalfHourId,
    MIDDAY_CUTOFF, OpenDate, OpenDateId, OpenDateSummary, SLOT_CAPACITY, Slot, SlotDetails, SlotId,
    StoreError,
};

/// `PostgreSQL`-based booking store.
///
/// Tables (see `migrations/`):
///
/// - `open_dates`: days open for booking
/// - `half_hours`: reference periods of the day
/// - `reservations`: one slot per (open date, half-hour) with its `count`
/// - `unique_reservations`: one row per booking, keyed by `hash`
///
/// Counter changes are conditional `UPDATE`s, so two requests racing for the
/// last place are serialized by the row lock and exactly one succeeds.
#[derive(Clone, Debug)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database at `database_url` with a default pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await.map_err(database)?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if migrations fail.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn slot_exists(&self, slot: SlotId) -> Result<bool, StoreError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reservations WHERE id = $1)")
            .bind(slot.0)
            .fetch_one(&self.pool)
            .await
            .map_err(database)
    }

    async fn booking_exists(&self, token: &BookingToken) -> Result<bool, StoreError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM unique_reservations WHERE hash = $1)")
            .bind(token.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(database)
    }
}

impl BookingStore for PostgresBookingStore {
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(database)?;
            Ok(())
        })
    }

    fn open_date(&self, date: NaiveDate) -> StoreFuture<'_, OpenDate> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(database)?;

            let row = sqlx::query(
                r"
                INSERT INTO open_dates (date)
                VALUES ($1)
                ON CONFLICT (date) DO UPDATE SET date = EXCLUDED.date
                RETURNING id, date
                ",
            )
            .bind(date)
            .fetch_one(&mut *tx)
            .await
            .map_err(database)?;
            let open_date = open_date_from_row(&row).map_err(database)?;

            let created = sqlx::query(
                r"
                INSERT INTO reservations (open_date_id, half_hour_id, count)
                SELECT $1, id, 0 FROM half_hours
                ON CONFLICT (open_date_id, half_hour_id) DO NOTHING
                ",
            )
            .bind(open_date.id.0)
            .execute(&mut *tx)
            .await
            .map_err(database)?
            .rows_affected();

            tx.commit().await.map_err(database)?;

            tracing::info!(
                open_date_id = open_date.id.0,
                date = %open_date.date,
                slots_created = created,
                "Date opened for booking"
            );

            Ok(open_date)
        })
    }

    fn list_half_hours(&self) -> StoreFuture<'_, Vec<HalfHour>> {
        Box::pin(async move {
            let rows = sqlx::query("SELECT id, period FROM half_hours ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(database)?;

            rows.iter()
                .map(half_hour_from_row)
                .collect::<Result<_, sqlx::Error>>()
                .map_err(database)
        })
    }

    fn list_open_dates(&self, range: DateRange) -> StoreFuture<'_, Vec<OpenDateSummary>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"
                SELECT
                    d.id,
                    d.date,
                    COALESCE(SUM(r.count) FILTER (WHERE r.half_hour_id <= $1), 0)::BIGINT AS total_am,
                    COALESCE(SUM(r.count) FILTER (WHERE r.half_hour_id > $1), 0)::BIGINT AS total_pm
                FROM open_dates d
                JOIN reservations r ON r.open_date_id = d.id
                WHERE ($2::DATE IS NULL OR d.date >= $2::DATE)
                  AND ($3::DATE IS NULL OR d.date <= $3::DATE)
                GROUP BY d.id, d.date
                HAVING bool_or(r.count < $4)
                ORDER BY d.date, d.id
                ",
            )
            .bind(MIDDAY_CUTOFF)
            .bind(range.from)
            .bind(range.to)
            .bind(SLOT_CAPACITY)
            .fetch_all(&self.pool)
            .await
            .map_err(database)?;

            rows.iter()
                .map(summary_from_row)
                .collect::<Result<_, sqlx::Error>>()
                .map_err(database)
        })
    }

    fn find_open_date(&self, id: OpenDateId) -> StoreFuture<'_, Option<OpenDate>> {
        Box::pin(async move {
            let row = sqlx::query("SELECT id, date FROM open_dates WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(database)?;

            row.as_ref()
                .map(open_date_from_row)
                .transpose()
                .map_err(database)
        })
    }

    fn list_available_slots(&self, id: OpenDateId) -> StoreFuture<'_, Vec<AvailableSlot>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"
                SELECT r.id, r.open_date_id, r.half_hour_id, r.count, h.period
                FROM reservations r
                JOIN half_hours h ON h.id = r.half_hour_id
                WHERE r.open_date_id = $1 AND r.count < $2
                ORDER BY r.half_hour_id, r.id
                ",
            )
            .bind(id.0)
            .bind(SLOT_CAPACITY)
            .fetch_all(&self.pool)
            .await
            .map_err(database)?;

            rows.iter()
                .map(available_slot_from_row)
                .collect::<Result<_, sqlx::Error>>()
                .map_err(database)
        })
    }

    fn list_slots(&self) -> StoreFuture<'_, Vec<Slot>> {
        Box::pin(async move {
            let rows =
                sqlx::query("SELECT id, open_date_id, half_hour_id, count FROM reservations ORDER BY id")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(database)?;

            rows.iter()
                .map(slot_from_row)
                .collect::<Result<_, sqlx::Error>>()
                .map_err(database)
        })
    }

    fn find_slot(&self, id: SlotId) -> StoreFuture<'_, Option<SlotDetails>> {
        Box::pin(async move {
            let row = sqlx::query(
                r"
                SELECT r.id, r.open_date_id, r.half_hour_id, r.count, d.date, h.period
                FROM reservations r
                JOIN open_dates d ON d.id = r.open_date_id
                JOIN half_hours h ON h.id = r.half_hour_id
                WHERE r.id = $1
                ",
            )
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database)?;

            row.as_ref()
                .map(slot_details_from_row)
                .transpose()
                .map_err(database)
        })
    }

    fn token_exists<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, bool> {
        Box::pin(async move { self.booking_exists(token).await })
    }

    fn reserve_slot<'a>(&'a self, slot: SlotId, token: &'a BookingToken) -> StoreFuture<'a, Slot> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(database)?;

            let row = sqlx::query(
                r"
                UPDATE reservations
                SET count = count + 1
                WHERE id = $1 AND count < $2
                RETURNING id, open_date_id, half_hour_id, count
                ",
            )
            .bind(slot.0)
            .bind(SLOT_CAPACITY)
            .fetch_optional(&mut *tx)
            .await
            .map_err(database)?;

            let Some(row) = row else {
                tx.rollback().await.map_err(database)?;
                if self.slot_exists(slot).await? {
                    tracing::debug!(slot_id = slot.0, "Conditional increment found slot full");
                    return Err(StoreError::SlotFull(slot));
                }
                return Err(StoreError::SlotNotFound(slot));
            };
            let updated = slot_from_row(&row).map_err(database)?;

            sqlx::query(
                r"
                INSERT INTO unique_reservations (hash, reservation_id, email_status)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(token.as_str())
            .bind(slot.0)
            .bind(EmailStatus::Pending.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return StoreError::DuplicateToken;
                    }
                }
                database(e)
            })?;

            tx.commit().await.map_err(database)?;

            tracing::debug!(slot_id = slot.0, count = updated.count, "Slot reserved");
            Ok(updated)
        })
    }

    fn find_booking<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, Option<Booking>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id, hash, reservation_id, email_status FROM unique_reservations WHERE hash = $1",
            )
            .bind(token.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(database)?;

            row.as_ref().map(booking_from_row).transpose()
        })
    }

    fn claim_email_delivery<'a>(
        &'a self,
        token: &'a BookingToken,
        resend: bool,
    ) -> StoreFuture<'a, EmailClaim> {
        Box::pin(async move {
            let previous: Option<String> = sqlx::query_scalar(
                r"
                WITH previous AS (
                    SELECT id, email_status
                    FROM unique_reservations
                    WHERE hash = $1
                    FOR UPDATE
                )
                UPDATE unique_reservations u
                SET email_status = 'sent'
                FROM previous
                WHERE u.id = previous.id
                  AND ($2::BOOLEAN OR previous.email_status <> 'sent')
                RETURNING previous.email_status
                ",
            )
            .bind(token.as_str())
            .bind(resend)
            .fetch_optional(&self.pool)
            .await
            .map_err(database)?;

            match previous {
                Some(previous) => Ok(EmailClaim::Claimed {
                    previous: parse_email_status(&previous)?,
                }),
                None if self.booking_exists(token).await? => Ok(EmailClaim::AlreadySent),
                None => Err(StoreError::BookingNotFound),
            }
        })
    }

    fn record_email_status<'a>(
        &'a self,
        token: &'a BookingToken,
        status: EmailStatus,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let result = sqlx::query("UPDATE unique_reservations SET email_status = $2 WHERE hash = $1")
                .bind(token.as_str())
                .bind(status.as_str())
                .execute(&self.pool)
                .await
                .map_err(database)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::BookingNotFound);
            }
            Ok(())
        })
    }

    fn cancel_booking<'a>(&'a self, token: &'a BookingToken) -> StoreFuture<'a, Slot> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(database)?;

            let slot_id: Option<i32> = sqlx::query_scalar(
                "DELETE FROM unique_reservations WHERE hash = $1 RETURNING reservation_id",
            )
            .bind(token.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(database)?;

            let Some(slot_id) = slot_id else {
                tx.rollback().await.map_err(database)?;
                return Err(StoreError::BookingNotFound);
            };

            let decremented = sqlx::query(
                r"
                UPDATE reservations
                SET count = count - 1
                WHERE id = $1 AND count > 0
                RETURNING id, open_date_id, half_hour_id, count
                ",
            )
            .bind(slot_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(database)?;

            let row = match decremented {
                Some(row) => row,
                None => {
                    tracing::warn!(slot_id, "Cancelled booking on a slot with count 0");
                    sqlx::query("SELECT id, open_date_id, half_hour_id, count FROM reservations WHERE id = $1")
                        .bind(slot_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(database)?
                        .ok_or(StoreError::SlotNotFound(SlotId(slot_id)))?
                }
            };
            let slot = slot_from_row(&row).map_err(database)?;

            tx.commit().await.map_err(database)?;

            tracing::debug!(slot_id, count = slot.count, "Booking cancelled");
            Ok(slot)
        })
    }
}

fn database(error: sqlx::Error) -> StoreError {
    StoreError::Database(error.to_string())
}

fn parse_email_status(raw: &str) -> Result<EmailStatus, StoreError> {
    raw.parse().map_err(StoreError::Database)
}

fn open_date_from_row(row: &PgRow) -> Result<OpenDate, sqlx::Error> {
    Ok(OpenDate {
        id: OpenDateId(row.try_get("id")?),
        date: row.try_get("date")?,
    })
}

fn half_hour_from_row(row: &PgRow) -> Result<HalfHour, sqlx::Error> {
    Ok(HalfHour {
        id: HalfHourId(row.try_get("id")?),
        period: row.try_get("period")?,
    })
}

fn summary_from_row(row: &PgRow) -> Result<OpenDateSummary, sqlx::Error> {
    Ok(OpenDateSummary {
        id: OpenDateId(row.try_get("id")?),
        date: row.try_get("date")?,
        total_am: row.try_get("total_am")?,
        total_pm: row.try_get("total_pm")?,
    })
}

fn available_slot_from_row(row: &PgRow) -> Result<AvailableSlot, sqlx::Error> {
    let slot = slot_from_row(row)?;
    Ok(AvailableSlot {
        half_hour: HalfHour {
            id: slot.half_hour_id,
            period: row.try_get("period")?,
        },
        slot,
    })
}

fn slot_from_row(row: &PgRow) -> Result<Slot, sqlx::Error> {
    Ok(Slot {
        id: SlotId(row.try_get("id")?),
        open_date_id: OpenDateId(row.try_get("open_date_id")?),
        half_hour_id: HalfHourId(row.try_get("half_hour_id")?),
        count: row.try_get("count")?,
    })
}

fn slot_details_from_row(row: &PgRow) -> Result<SlotDetails, sqlx::Error> {
    let slot = slot_from_row(row)?;
    Ok(SlotDetails {
        open_date: OpenDate {
            id: slot.open_date_id,
            date: row.try_get("date")?,
        },
        half_hour: HalfHour {
            id: slot.half_hour_id,
            period: row.try_get("period")?,
        },
        slot,
    })
}

fn booking_from_row(row: &PgRow) -> Result<Booking, StoreError> {
    let status: String = row.try_get("email_status").map_err(database)?;
    Ok(Booking {
        id: BookingId(row.try_get("id").map_err(database)?),
        token: BookingToken::new(row.try_get::<String, _>("hash").map_err(database)?),
        slot_id: SlotId(row.try_get("reservation_id").map_err(database)?),
        email_status: parse_email_status(&status)?,
    })
}
