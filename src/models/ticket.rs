//! Ticket model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::query::{Filter, Filters, ListParams, ListQuery};

/// Ticket category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    #[serde(alias = "VIP")]
    Vip,
    #[serde(alias = "REGULAR")]
    Regular,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Vip => "vip",
            TicketType::Regular => "regular",
        }
    }

    /// Prefix used when generating seat numbers
    pub fn seat_prefix(&self) -> &'static str {
        match self {
            TicketType::Vip => "VIP",
            TicketType::Regular => "REG",
        }
    }

    pub fn seat_number(&self, n: i64) -> String {
        format!("{}-{:03}", self.seat_prefix(), n)
    }
}

impl std::str::FromStr for TicketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vip" => Ok(TicketType::Vip),
            "regular" => Ok(TicketType::Regular),
            _ => Err(format!("Invalid ticket type: {}", s)),
        }
    }
}

super::text_column!(TicketType);

/// Ticket record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: i64,
    /// Order holding this ticket, `null` while available
    pub order_id: Option<i64>,
    pub price: Decimal,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub ticket_type: TicketType,
    pub seat_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Issue a batch of tickets for an event
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTicket {
    #[validate(range(min = 1, message = "event_id is required"))]
    pub event_id: i64,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    /// Number of tickets to issue
    #[validate(range(min = 1, max = 1000, message = "count must be between 1 and 1000"))]
    pub count: i64,
}

/// Update ticket request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTicket {
    #[validate(range(min = 1))]
    pub event_id: Option<i64>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[serde(rename = "type")]
    pub ticket_type: Option<TicketType>,
    #[validate(length(min = 1, max = 50))]
    pub seat_number: Option<String>,
}

fn validate_price(price: &Decimal) -> Result<(), validator::ValidationError> {
    if price.is_sign_negative() {
        return Err(validator::ValidationError::new("negative_price"));
    }
    Ok(())
}

/// Query parameters for tickets
#[serde_as]
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct TicketQuery {
    pub id: Option<Uuid>,
    pub event_id: Option<i64>,
    pub order_id: Option<i64>,
    pub price: Option<Decimal>,
    /// vip or regular
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    /// Case-insensitive substring of the seat number
    pub seat_number: Option<String>,
    /// Comma separated list of exact seat numbers
    pub seat_numbers: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub page: Option<i64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub size: Option<i64>,
    /// One of id, event_id, order_id, price, type, seat_number, created_at
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListQuery for TicketQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .eq("id", self.id)
            .eq("event_id", self.event_id)
            .eq("order_id", self.order_id)
            .eq("price", self.price)
            .eq_ignore_case("type", self.ticket_type.as_deref())
            .contains("seat_number", self.seat_number.as_deref())
            .any_of("seat_number", self.seat_numbers.as_deref())
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
