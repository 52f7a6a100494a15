//! Listing parameters shared by every paginated endpoint
//!
//! Each listable entity has its own query-options struct (see `VenueQuery`,
//! `EventQuery`, ...). Those structs describe their filters as a list of
//! [`Filter`] values and expose their raw paging/sorting parameters through
//! [`ListQuery`]. Turning that into SQL is the repository's job.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_SIZE: i64 = 10;

/// Normalized pagination, always `page >= 1` and `size >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub size: i64,
}

impl Pagination {
    pub fn normalize(page: Option<i64>, size: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p,
            _ => DEFAULT_PAGE,
        };
        let size = match size {
            Some(s) if s >= 1 => s,
            _ => DEFAULT_SIZE,
        };
        Self { page, size }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            total / self.size + i64::from(total % self.size != 0)
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_SIZE,
        }
    }
}

/// Paging metadata returned alongside list payloads
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageMetadata {
    pub page: i64,
    pub size: i64,
    pub total_item: i64,
    pub total_page: i64,
}

impl PageMetadata {
    pub fn new(pagination: Pagination, total: i64) -> Self {
        Self {
            page: pagination.page,
            size: pagination.size,
            total_item: total,
            total_page: pagination.total_pages(total),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Accepts `asc` / `desc` in any case, nothing else
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A value bound into a generated statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i32),
    BigInt(i64),
    Text(String),
    Decimal(Decimal),
    Bool(bool),
    Date(NaiveDate),
    Time(chrono::NaiveTime),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Uuid(Uuid),
    TextList(Vec<String>),
}

impl SqlValue {
    /// Zero ids and empty strings are treated as "not provided"
    pub fn is_blank(&self) -> bool {
        match self {
            SqlValue::Int(v) => *v == 0,
            SqlValue::BigInt(v) => *v == 0,
            SqlValue::Text(v) => v.trim().is_empty(),
            SqlValue::Uuid(v) => v.is_nil(),
            SqlValue::TextList(v) => v.is_empty(),
            _ => false,
        }
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<chrono::NaiveTime> for SqlValue {
    fn from(v: chrono::NaiveTime) -> Self {
        SqlValue::Time(v)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for SqlValue {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(v: Vec<String>) -> Self {
        SqlValue::TextList(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `column = value`
    Eq,
    /// `LOWER(column) = LOWER(value)`
    EqIgnoreCase,
    /// case-insensitive substring match
    Contains,
    /// date portion of a timestamp column equals the value
    DateEq,
    /// `column = ANY(value)`
    AnyOf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub op: FilterOp,
    pub value: SqlValue,
}

/// Collects the conditions of a query-options struct, skipping absent values
#[derive(Debug, Default)]
pub struct Filters(Vec<Filter>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, column: &'static str, op: FilterOp, value: Option<SqlValue>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_blank()) {
            self.0.push(Filter { column, op, value });
        }
        self
    }

    pub fn eq<V: Into<SqlValue>>(self, column: &'static str, value: Option<V>) -> Self {
        self.push(column, FilterOp::Eq, value.map(Into::into))
    }

    pub fn eq_ignore_case(self, column: &'static str, value: Option<&str>) -> Self {
        self.push(column, FilterOp::EqIgnoreCase, value.map(SqlValue::from))
    }

    pub fn contains(self, column: &'static str, value: Option<&str>) -> Self {
        self.push(column, FilterOp::Contains, value.map(SqlValue::from))
    }

    pub fn date(self, column: &'static str, value: Option<NaiveDate>) -> Self {
        self.push(column, FilterOp::DateEq, value.map(SqlValue::from))
    }

    /// Comma separated list, e.g. `A-001,A-002`
    pub fn any_of(self, column: &'static str, value: Option<&str>) -> Self {
        let values = value.map(|raw| {
            SqlValue::TextList(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        });
        self.push(column, FilterOp::AnyOf, values)
    }

    pub fn into_vec(self) -> Vec<Filter> {
        self.0
    }
}

/// Raw paging and sorting parameters as received from the client
#[derive(Debug, Clone, Copy, Default)]
pub struct ListParams<'a> {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<&'a str>,
    pub order: Option<&'a str>,
}

/// Implemented by every query-options struct
pub trait ListQuery: Serialize + Send + Sync {
    fn filters(&self) -> Vec<Filter>;

    fn params(&self) -> ListParams<'_>;

    fn pagination(&self) -> Pagination {
        let params = self.params();
        Pagination::normalize(params.page, params.size)
    }
}
