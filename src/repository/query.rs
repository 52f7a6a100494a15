//! Query builder for paginated listings
//!
//! A [`QuerySpec`] is the pure description of a listing: which table, which
//! AND-composed conditions and which ordering. It is rendered into SQL with
//! `sqlx::QueryBuilder`. Column names only ever come from `&'static str`
//! tables defined next to each entity; every client-supplied value is sent as
//! a bound parameter.

use sqlx::{Postgres, QueryBuilder};

use crate::models::query::{
    Filter, FilterOp, ListQuery, Pagination, SortDirection, SqlValue,
};

/// Column used when no valid ordering was requested
pub const DEFAULT_SORT_COLUMN: &str = "created_at";

/// An allow-listed sort key: the name accepted from clients and the column it maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
}

impl SortField {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }

    /// Sort key whose request name is the column name
    pub const fn column(column: &'static str) -> Self {
        Self { name: column, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl OrderBy {
    pub const fn default_order() -> Self {
        Self {
            column: DEFAULT_SORT_COLUMN,
            direction: SortDirection::Desc,
        }
    }

    /// Both the field and the direction must be valid, otherwise the default order applies
    pub fn resolve(allowed: &[SortField], field: Option<&str>, direction: Option<&str>) -> Self {
        let column = field
            .map(str::trim)
            .and_then(|name| allowed.iter().find(|f| f.name == name))
            .map(|f| f.column);
        let direction = direction.and_then(SortDirection::parse);

        match (column, direction) {
            (Some(column), Some(direction)) => Self { column, direction },
            _ => Self::default_order(),
        }
    }
}

/// Pure description of a filtered, sorted listing
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    table: &'static str,
    id_column: &'static str,
    filters: Vec<Filter>,
    order: OrderBy,
}

impl QuerySpec {
    pub fn new(
        table: &'static str,
        id_column: &'static str,
        filters: Vec<Filter>,
        order: OrderBy,
    ) -> Self {
        Self {
            table,
            id_column,
            filters,
            order,
        }
    }

    /// Translate query options into a spec for `table`
    pub fn build<Q: ListQuery>(
        table: &'static str,
        id_column: &'static str,
        allowed: &[SortField],
        query: &Q,
    ) -> Self {
        let params = query.params();
        Self::new(
            table,
            id_column,
            query.filters(),
            OrderBy::resolve(allowed, params.sort, params.order),
        )
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order(&self) -> OrderBy {
        self.order
    }

    /// `SELECT COUNT(*) FROM table WHERE ...`
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.table));
        self.push_where(&mut qb);
        qb
    }

    /// `SELECT * FROM table WHERE ... ORDER BY ... LIMIT ... OFFSET ...`
    pub fn select_query(&self, pagination: Pagination) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", self.table));
        self.push_where(&mut qb);
        self.push_order(&mut qb);
        qb.push(" LIMIT ");
        qb.push_bind(pagination.size);
        qb.push(" OFFSET ");
        qb.push_bind(pagination.offset());
        qb
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for (i, filter) in self.filters.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            push_condition(qb, filter);
        }
    }

    fn push_order(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let dir = self.order.direction.as_sql();
        qb.push(format!(" ORDER BY {} {}", self.order.column, dir));
        // Primary key tie-breaker keeps page boundaries stable on duplicate sort values
        if self.order.column != self.id_column {
            qb.push(format!(", {} {}", self.id_column, dir));
        }
    }
}

fn push_condition(qb: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    let column = filter.column;
    match filter.op {
        FilterOp::Eq => {
            qb.push(format!("{} = ", column));
            push_value(qb, &filter.value);
        }
        FilterOp::EqIgnoreCase => {
            qb.push(format!("LOWER({}) = LOWER(", column));
            push_value(qb, &filter.value);
            qb.push(")");
        }
        FilterOp::Contains => {
            qb.push(format!("{} ILIKE ", column));
            let pattern = match &filter.value {
                SqlValue::Text(s) => format!("%{}%", escape_like(s.trim())),
                other => format!("%{}%", escape_like(&sql_value_text(other))),
            };
            qb.push_bind(pattern);
        }
        FilterOp::DateEq => {
            qb.push(format!("CAST({} AS DATE) = ", column));
            push_value(qb, &filter.value);
        }
        FilterOp::AnyOf => {
            qb.push(format!("{} = ANY(", column));
            push_value(qb, &filter.value);
            qb.push(")");
        }
    }
}

/// Bind a value with the SQL type matching its variant
pub fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &SqlValue) {
    match value {
        SqlValue::Int(v) => qb.push_bind(*v),
        SqlValue::BigInt(v) => qb.push_bind(*v),
        SqlValue::Text(v) => qb.push_bind(v.clone()),
        SqlValue::Decimal(v) => qb.push_bind(*v),
        SqlValue::Bool(v) => qb.push_bind(*v),
        SqlValue::Date(v) => qb.push_bind(*v),
        SqlValue::Time(v) => qb.push_bind(*v),
        SqlValue::Timestamp(v) => qb.push_bind(*v),
        SqlValue::Uuid(v) => qb.push_bind(*v),
        SqlValue::TextList(v) => qb.push_bind(v.clone()),
    };
}

fn sql_value_text(value: &SqlValue) -> String {
    match value {
        SqlValue::Int(v) => v.to_string(),
        SqlValue::BigInt(v) => v.to_string(),
        SqlValue::Text(v) => v.clone(),
        SqlValue::Decimal(v) => v.to_string(),
        SqlValue::Bool(v) => v.to_string(),
        SqlValue::Date(v) => v.to_string(),
        SqlValue::Time(v) => v.to_string(),
        SqlValue::Timestamp(v) => v.to_rfc3339(),
        SqlValue::Uuid(v) => v.to_string(),
        SqlValue::TextList(v) => v.join(","),
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
