//! Repository layer for database operations
//!
//! [`PgRepository`] implements create / get / update / delete and paginated
//! listing once for every type implementing [`Entity`]. Entities describe
//! themselves through static tables (table name, sortable columns, the
//! columns written on insert and update); the SQL is assembled from those
//! tables by the query builder in [`query`].

pub mod events;
pub mod orders;
pub mod query;
pub mod tickets;
pub mod users;
pub mod venues;

use std::{fmt::Display, marker::PhantomData};

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Executor, FromRow, Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        query::{ListQuery, SqlValue},
        Event, Venue,
    },
};
use query::{push_value, QuerySpec, SortField};

/// A database-backed record type
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    type Id: Clone + Display + Into<SqlValue> + Send + Sync;
    type Query: ListQuery;
    type Create: Send + Sync;
    type Update: Send + Sync;

    const TABLE: &'static str;
    /// Human readable name used in error messages
    const NAME: &'static str;
    const ID_COLUMN: &'static str = "id";
    /// Sort keys accepted from clients
    const SORTABLE: &'static [SortField];

    fn insert_values(data: &Self::Create) -> Vec<(&'static str, SqlValue)>;

    /// Only the columns that change; `updated_at` is always refreshed
    fn update_values(data: &Self::Update) -> Vec<(&'static str, SqlValue)>;

    fn not_found(id: &Self::Id) -> AppError {
        AppError::NotFound(format!("{} {} not found", Self::NAME, id))
    }
}

/// CRUD and listing over one entity type
#[async_trait]
pub trait Crud<E: Entity>: Send + Sync {
    async fn create(&self, data: &E::Create) -> AppResult<E>;

    async fn get_by_id(&self, id: &E::Id) -> AppResult<E>;

    async fn update(&self, id: &E::Id, data: &E::Update) -> AppResult<E>;

    async fn delete(&self, id: &E::Id) -> AppResult<()>;

    /// Returns the requested page and the total number of matching rows
    async fn get_paginated(&self, query: &E::Query) -> AppResult<(Vec<E>, i64)>;
}

/// PostgreSQL implementation of [`Crud`]
pub struct PgRepository<E> {
    pool: Pool<Postgres>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> PgRepository<E> {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Build the listing query without running it
    pub fn query_spec(query: &E::Query) -> QuerySpec {
        QuerySpec::build(E::TABLE, E::ID_COLUMN, E::SORTABLE, query)
    }
}

#[async_trait]
impl<E: Entity> Crud<E> for PgRepository<E> {
    async fn create(&self, data: &E::Create) -> AppResult<E> {
        insert_row::<E, _>(&self.pool, E::insert_values(data)).await
    }

    async fn get_by_id(&self, id: &E::Id) -> AppResult<E> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT * FROM {} WHERE {} = ",
            E::TABLE,
            E::ID_COLUMN
        ));
        push_value(&mut qb, &id.clone().into());

        qb.build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| E::not_found(id))
    }

    async fn update(&self, id: &E::Id, data: &E::Update) -> AppResult<E> {
        update_row::<E, _>(&self.pool, id, E::update_values(data)).await
    }

    async fn delete(&self, id: &E::Id) -> AppResult<()> {
        let mut qb = QueryBuilder::new(format!(
            "DELETE FROM {} WHERE {} = ",
            E::TABLE,
            E::ID_COLUMN
        ));
        push_value(&mut qb, &id.clone().into());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(E::not_found(id));
        }
        Ok(())
    }

    async fn get_paginated(&self, query: &E::Query) -> AppResult<(Vec<E>, i64)> {
        let pagination = query.pagination();
        let spec = Self::query_spec(query);

        // Count and page are read separately; the total is a point-in-time figure
        let total: i64 = spec
            .count_query()
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let rows = spec
            .select_query(pagination)
            .build_query_as::<E>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}

/// `INSERT INTO table (...) VALUES (...) RETURNING *` on any executor
pub(crate) async fn insert_row<'c, E, X>(
    executor: X,
    values: Vec<(&'static str, SqlValue)>,
) -> AppResult<E>
where
    E: Entity,
    X: Executor<'c, Database = Postgres>,
{
    let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        E::TABLE,
        columns.join(", ")
    ));
    for (i, (_, value)) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, value);
    }
    qb.push(") RETURNING *");

    Ok(qb.build_query_as::<E>().fetch_one(executor).await?)
}

/// `UPDATE table SET ... WHERE id = ... RETURNING *` on any executor
pub(crate) async fn update_row<'c, E, X>(
    executor: X,
    id: &E::Id,
    values: Vec<(&'static str, SqlValue)>,
) -> AppResult<E>
where
    E: Entity,
    X: Executor<'c, Database = Postgres>,
{
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", E::TABLE));
    for (column, value) in &values {
        qb.push(format!("{} = ", column));
        push_value(&mut qb, value);
        qb.push(", ");
    }
    qb.push(format!("updated_at = NOW() WHERE {} = ", E::ID_COLUMN));
    push_value(&mut qb, &id.clone().into());
    qb.push(" RETURNING *");

    qb.build_query_as::<E>()
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| E::not_found(id))
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub venues: PgRepository<Venue>,
    pub events: PgRepository<Event>,
    pub tickets: tickets::TicketsRepository,
    pub orders: orders::OrdersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            venues: PgRepository::new(pool.clone()),
            events: PgRepository::new(pool.clone()),
            tickets: tickets::TicketsRepository::new(pool.clone()),
            orders: orders::OrdersRepository::new(pool.clone()),
            pool,
        }
    }
}
