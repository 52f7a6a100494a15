//! Order model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    query::{Filter, Filters, ListParams, ListQuery},
    ticket::Ticket,
};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Only pending orders move, and only to a terminal state
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid) | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

super::text_column!(OrderStatus);

/// Order record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// When the order was placed
    pub date: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order with the tickets it holds
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub tickets: Vec<Ticket>,
}

/// Place an order for a set of available tickets
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrder {
    #[validate(length(min = 1, max = 50, message = "Between 1 and 50 tickets per order"))]
    pub ticket_ids: Vec<Uuid>,
}

/// Insert payload used by the repository
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub status: OrderStatus,
}

/// Status change request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
}

/// Query parameters for orders
#[serde_as]
#[derive(Debug, Default, Clone, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct OrderQuery {
    pub id: Option<i64>,
    /// Ignored for non-admin callers, who only see their own orders
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
    /// Order date (YYYY-MM-DD)
    pub date: Option<NaiveDate>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub page: Option<i64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub size: Option<i64>,
    /// One of id, user_id, date, total_price, status, created_at
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListQuery for OrderQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .eq("id", self.id)
            .eq("user_id", self.user_id)
            .eq("status", self.status)
            .date("date", self.date)
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
