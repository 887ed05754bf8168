//! Open date listing.
//!
//! - GET /api/open-dates - Dates with at least one bookable slot

use crate::server::state::AppState;
use crate::services::DateFilter;
use axum::{Json, extract::State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tree_farm_core::{OpenDateId, OpenDateSummary};
use tree_farm_web::{AppError, QueryParams};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters of `GET /api/open-dates`.
#[derive(Debug, Default, Deserialize)]
pub struct OpenDatesQuery {
    /// Earliest date (inclusive)
    pub from: Option<NaiveDate>,
    /// Latest date (inclusive)
    pub to: Option<NaiveDate>,
    /// Only dates from today onwards
    pub upcoming: Option<bool>,
}

/// An open date with its AM/PM occupancy.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenDateResponse {
    /// Open date id (`dateId` of the slot query)
    pub id: OpenDateId,
    /// Calendar date
    pub date: NaiveDate,
    /// Bookings in morning slots
    #[serde(rename = "totalAM")]
    pub total_am: i64,
    /// Bookings in afternoon slots
    #[serde(rename = "totalPM")]
    pub total_pm: i64,
}

impl From<OpenDateSummary> for OpenDateResponse {
    fn from(summary: OpenDateSummary) -> Self {
        Self {
            id: summary.id,
            date: summary.date,
            total_am: summary.total_am,
            total_pm: summary.total_pm,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List open dates that still have room.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/open-dates?upcoming=true"
/// ```
///
/// Response:
/// ```json
/// [
///   { "id": 1, "date": "2024-12-24", "totalAM": 9, "totalPM": 0 }
/// ]
/// ```
pub async fn list_open_dates(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OpenDatesQuery>,
) -> Result<Json<Vec<OpenDateResponse>>, AppError> {
    let filter = DateFilter {
        from: query.from,
        to: query.to,
        upcoming: query.upcoming.unwrap_or(false),
    };

    let dates = state.availability.list_open_dates(filter).await?;

    Ok(Json(dates.into_iter().map(OpenDateResponse::from).collect()))
}
