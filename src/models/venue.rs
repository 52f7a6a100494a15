//! Venue model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::query::{Filter, Filters, ListParams, ListQuery};

/// Venue record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub address: String,
    /// Maximum number of tickets that can be issued per event
    pub capacity: i32,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create venue request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVenue {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Address is required"))]
    pub address: String,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub zip: String,
}

/// Update venue request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVenue {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub zip: Option<String>,
}

/// Query parameters for venues
#[serde_as]
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct VenueQuery {
    pub id: Option<i64>,
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    pub address: Option<String>,
    pub capacity: Option<i32>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    /// Page number (1-based)
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub page: Option<i64>,
    /// Items per page
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub size: Option<i64>,
    /// One of id, name, address, capacity, city, state, zip, created_at
    pub sort: Option<String>,
    /// asc or desc
    pub order: Option<String>,
}

impl ListQuery for VenueQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .eq("id", self.id)
            .contains("name", self.name.as_deref())
            .contains("address", self.address.as_deref())
            .eq("capacity", self.capacity)
            .contains("city", self.city.as_deref())
            .contains("state", self.state.as_deref())
            .eq("zip", self.zip.clone())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_paging_params_are_absent() {
        let query: VenueQuery =
            serde_json::from_value(serde_json::json!({ "page": "", "size": "25", "city": "Bandung" }))
                .unwrap();
        assert_eq!(query.page, None);
        assert_eq!(query.size, Some(25));
        assert_eq!(query.pagination().page, 1);
        assert_eq!(query.pagination().size, 25);
    }

    #[test]
    fn test_capacity_must_be_positive() {
        let venue = CreateVenue {
            name: "Hall".to_string(),
            address: "1 Main St".to_string(),
            capacity: 0,
            city: "Bandung".to_string(),
            state: "West Java".to_string(),
            zip: "40111".to_string(),
        };
        assert!(venue.validate().unwrap_err().field_errors().contains_key("capacity"));
    }
}
