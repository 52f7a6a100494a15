//! Event model (concerts, shows and other ticketed happenings)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::query::{Filter, Filters, ListParams, ListQuery};

/// Event record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub id: i64,
    pub venue_id: i64,
    pub name: String,
    pub description: String,
    /// Event date
    pub date: NaiveDate,
    /// Start time
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create event request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(range(min = 1, message = "venue_id is required"))]
    pub venue_id: i64,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Event date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Start time (HH:MM:SS)
    pub time: NaiveTime,
}

/// Update event request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEvent {
    #[validate(range(min = 1))]
    pub venue_id: Option<i64>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

/// Query parameters for events
#[serde_as]
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct EventQuery {
    pub id: Option<i64>,
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Case-insensitive substring of the description
    pub description: Option<String>,
    /// Event date (YYYY-MM-DD)
    pub date: Option<NaiveDate>,
    /// Start time (HH:MM:SS)
    pub time: Option<NaiveTime>,
    pub venue_id: Option<i64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub page: Option<i64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub size: Option<i64>,
    /// One of id, name, description, date, time, venue_id, created_at
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListQuery for EventQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .eq("id", self.id)
            .contains("name", self.name.as_deref())
            .contains("description", self.description.as_deref())
            .date("date", self.date)
            .eq("time", self.time)
            .eq("venue_id", self.venue_id)
            .into_vec()
    }

    fn params(&self) -> ListParams<'_> {
        ListParams {
            page: self.page,
            size: self.size,
            sort: self.sort.as_deref(),
            order: self.order.as_deref(),
        }
    }
}
