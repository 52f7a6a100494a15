//! Orders repository

use std::collections::HashSet;

use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{insert_row, query::SortField, Crud, Entity, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        order::{NewOrder, Order, OrderDetails, OrderQuery, OrderStatus, UpdateOrder},
        query::SqlValue,
        Ticket,
    },
};

impl Entity for Order {
    type Id = i64;
    type Query = OrderQuery;
    type Create = NewOrder;
    type Update = UpdateOrder;

    const TABLE: &'static str = "orders";
    const NAME: &'static str = "Order";
    const SORTABLE: &'static [SortField] = &[
        SortField::column("id"),
        SortField::column("user_id"),
        SortField::new("userId", "user_id"),
        SortField::column("date"),
        SortField::column("total_price"),
        SortField::new("totalPrice", "total_price"),
        SortField::column("status"),
        SortField::column("created_at"),
    ];

    fn insert_values(data: &NewOrder) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("user_id", data.user_id.into()),
            ("total_price", Decimal::ZERO.into()),
            ("status", data.status.into()),
        ]
    }

    fn update_values(data: &UpdateOrder) -> Vec<(&'static str, SqlValue)> {
        let mut values = Vec::new();
        if let Some(status) = data.status {
            values.push(("status", status.into()));
        }
        values
    }
}

#[derive(Clone)]
pub struct OrdersRepository {
    inner: PgRepository<Order>,
}

impl OrdersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            inner: PgRepository::new(pool),
        }
    }

    fn pool(&self) -> &Pool<Postgres> {
        self.inner.pool()
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Order> {
        self.inner.get_by_id(&id).await
    }

    pub async fn list(&self, query: &OrderQuery) -> AppResult<(Vec<Order>, i64)> {
        self.inner.get_paginated(query).await
    }

    /// Create a pending order holding the given tickets.
    ///
    /// Tickets are claimed with `order_id IS NULL` as the guard; if any of
    /// them is missing or already sold the whole order is rolled back.
    pub async fn create_with_tickets(
        &self,
        user_id: i64,
        ticket_ids: &[Uuid],
    ) -> AppResult<OrderDetails> {
        let ids: Vec<Uuid> = {
            let mut seen = HashSet::new();
            ticket_ids.iter().copied().filter(|id| seen.insert(*id)).collect()
        };

        let mut tx = self.pool().begin().await?;

        let order = insert_row::<Order, _>(
            &mut *tx,
            Order::insert_values(&NewOrder {
                user_id,
                status: OrderStatus::Pending,
            }),
        )
        .await?;

        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET order_id = $1, updated_at = NOW()
            WHERE id = ANY($2) AND order_id IS NULL
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        if tickets.len() != ids.len() {
            // Dropping the transaction rolls back the order and the claims
            return Err(AppError::Conflict(format!(
                "{} of {} requested tickets are unavailable",
                ids.len() - tickets.len(),
                ids.len()
            )));
        }

        let total: Decimal = tickets.iter().map(|t| t.price).sum();
        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET total_price = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(total)
        .bind(order.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Order {} claimed {} tickets", order.id, tickets.len());
        Ok(OrderDetails { order, tickets })
    }

    /// Move an order from `from` to `to`.
    ///
    /// The current status is part of the `WHERE` clause, so a concurrent
    /// change surfaces as `Conflict` instead of being overwritten. Cancelling
    /// releases the order's tickets in the same transaction.
    pub async fn transition(&self, id: i64, from: OrderStatus, to: OrderStatus) -> AppResult<Order> {
        let mut tx = self.pool().begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(to)
        .bind(id)
        .bind(from)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Order {} is no longer {}", id, from)))?;

        if to == OrderStatus::Cancelled {
            let released = sqlx::query(
                "UPDATE tickets SET order_id = NULL, updated_at = NOW() WHERE order_id = $1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            tracing::debug!("Order {} cancelled, released {} tickets", id, released);
        }

        tx.commit().await?;
        Ok(order)
    }
}
