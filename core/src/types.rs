//! Domain types for the booking service.
//!
//! Rows mirror the relational schema (`open_dates`, `half_hours`,
//! `reservations`, `unique_reservations`). The `reservations` table holds
//! [`Slot`]s and `unique_reservations` holds [`Booking`]s; the table names are
//! kept for compatibility with the existing front end.

use crate::error::BookingError;
use crate::{MIDDAY_CUTOFF, SLOT_CAPACITY};
use chrono::{Datelike, Month, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of an [`OpenDate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenDateId(pub i32);

impl fmt::Display for OpenDateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OpenDateId {
    type Err = BookingError;

    /// Parses a date id as sent in the `dateId` query parameter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| BookingError::InvalidDateId(s.to_string()))
    }
}

/// Identifier of a [`HalfHour`].
///
/// Ids are assigned in time-of-day order, so they double as the ordering key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HalfHourId(pub i32);

impl HalfHourId {
    /// Whether this half-hour counts towards the morning (AM) total.
    #[must_use]
    pub const fn is_morning(self) -> bool {
        self.0 <= MIDDAY_CUTOFF
    }
}

impl fmt::Display for HalfHourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a [`Slot`] (a row of the `reservations` table).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub i32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a [`Booking`] row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub i32);

/// Opaque booking token (the `hash` column).
///
/// Minted by [`TokenMinter`](crate::token::TokenMinter) as 64 lowercase hex
/// characters. Tokens received from clients are not required to be well formed;
/// a malformed token simply never matches a stored booking.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingToken(String);

impl BookingToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token has the shape of a minted token (64 hex characters).
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 64 && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for BookingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Reference data
// ============================================================================

/// A calendar date on which booking is permitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenDate {
    /// Identifier
    pub id: OpenDateId,
    /// Calendar date
    pub date: NaiveDate,
}

/// A fixed time-of-day period such as `"8:30"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfHour {
    /// Identifier (time-of-day order)
    pub id: HalfHourId,
    /// Display string, `H:MM`
    pub period: String,
}

impl HalfHour {
    /// Display time used in confirmations: `9:00` becomes `9h00`.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.period.replace(':', "h")
    }
}

// ============================================================================
// Slots
// ============================================================================

/// One (open date, half-hour) pair with its occupancy counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Identifier (`reservationId` on the wire)
    pub id: SlotId,
    /// Owning open date
    pub open_date_id: OpenDateId,
    /// Half-hour of the day
    pub half_hour_id: HalfHourId,
    /// Number of bookings, `0..=SLOT_CAPACITY`
    pub count: i32,
}

impl Slot {
    /// Whether the slot has reached capacity.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.count >= SLOT_CAPACITY
    }

    /// Remaining places (never negative).
    #[must_use]
    pub const fn remaining(&self) -> i32 {
        if self.count >= SLOT_CAPACITY {
            0
        } else {
            SLOT_CAPACITY - self.count
        }
    }
}

/// A slot joined with its date and half-hour, as needed to book it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotDetails {
    /// The slot row
    pub slot: Slot,
    /// The open date the slot belongs to
    pub open_date: OpenDate,
    /// The half-hour the slot covers
    pub half_hour: HalfHour,
}

/// A slot with remaining capacity, joined with its half-hour label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailableSlot {
    /// The slot row
    pub slot: Slot,
    /// The half-hour the slot covers
    pub half_hour: HalfHour,
}

/// An open date with at least one bookable slot and its occupancy split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenDateSummary {
    /// Identifier
    pub id: OpenDateId,
    /// Calendar date
    pub date: NaiveDate,
    /// Bookings in morning slots
    pub total_am: i64,
    /// Bookings in afternoon slots
    pub total_pm: i64,
}

/// Optional inclusive date range used to filter open dates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Earliest date (inclusive)
    pub from: Option<NaiveDate>,
    /// Latest date (inclusive)
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range, rejecting `from > to`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidDateRange`] when the bounds are inverted.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, BookingError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(BookingError::InvalidDateRange { from, to });
            }
        }
        Ok(Self { from, to })
    }

    /// Unbounded range.
    #[must_use]
    pub const fn all() -> Self {
        Self { from: None, to: None }
    }

    /// Whether `date` falls within the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// Delivery state of a booking's confirmation email.
///
/// ```text
/// Pending ──claim──▶ Sent ──delivery failed──▶ Failed
///    ▲                 │ (resend)                │
///    └─────────────────┴──────────claim──────────┘
/// ```
///
/// `Failed` is treated like `Pending` by the next send attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    /// No confirmation delivered yet
    #[default]
    Pending,
    /// Confirmation delivered (or delivery in flight)
    Sent,
    /// Last delivery attempt failed
    Failed,
}

impl EmailStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    /// Whether the email counts as sent (`emailSent` on the wire).
    #[must_use]
    pub const fn is_sent(self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl FromStr for EmailStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown email status: {other}")),
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful booking of a slot (a row of `unique_reservations`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Row identifier
    pub id: BookingId,
    /// Opaque token (`hash`)
    pub token: BookingToken,
    /// Booked slot
    pub slot_id: SlotId,
    /// Confirmation email state
    pub email_status: EmailStatus,
}

/// What the caller receives after a successful booking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingConfirmation {
    /// Booking token
    pub token: BookingToken,
    /// Contact email
    pub email: String,
    /// Booked date
    pub date: NaiveDate,
    /// Display time of the slot (`9h00`)
    pub time: String,
}

/// Language of customer-facing messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    /// English (default)
    #[default]
    English,
    /// French
    French,
}

impl Language {
    /// Resolve the optional `language` field of a request.
    ///
    /// Only `"fr"` selects French; anything else falls back to English.
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some(tag) if tag.eq_ignore_ascii_case("fr") => Self::French,
            _ => Self::English,
        }
    }

    /// Long, customer-facing form of `date`.
    ///
    /// English reads `Tuesday, December 24th, 2024`; French reads
    /// `mardi 24 décembre 2024`.
    #[must_use]
    pub fn format_date(self, date: NaiveDate) -> String {
        let day = date.day();
        match self {
            Self::English => format!(
                "{}, {} {day}{}, {}",
                date.format("%A"),
                date.format("%B"),
                ordinal_suffix(day),
                date.year()
            ),
            Self::French => format!(
                "{} {day} {} {}",
                french_weekday(date.weekday()),
                french_month(date.month()),
                date.year()
            ),
        }
    }
}

const fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

const fn french_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lundi",
        Weekday::Tue => "mardi",
        Weekday::Wed => "mercredi",
        Weekday::Thu => "jeudi",
        Weekday::Fri => "vendredi",
        Weekday::Sat => "samedi",
        Weekday::Sun => "dimanche",
    }
}

fn french_month(month: u32) -> &'static str {
    match u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok()) {
        Some(Month::January) => "janvier",
        Some(Month::February) => "février",
        Some(Month::March) => "mars",
        Some(Month::April) => "avril",
        Some(Month::May) => "mai",
        Some(Month::June) => "juin",
        Some(Month::July) => "juillet",
        Some(Month::August) => "août",
        Some(Month::September) => "septembre",
        Some(Month::October) => "octobre",
        Some(Month::November) => "novembre",
        Some(Month::December) | None => "décembre",
    }
}

/// Basic email address validation.
///
/// Checks the shape only: exactly one `@`, non-empty local part, a dotted
/// domain without empty labels, and a sane length.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local)
        && domain.chars().all(valid_domain)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
