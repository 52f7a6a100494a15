//! Tickets repository

use rust_decimal::Decimal;
use sqlx::{Executor, Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{insert_row, query::SortField, update_row, Crud, Entity, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        query::SqlValue,
        ticket::{CreateTicket, Ticket, TicketQuery, TicketType, UpdateTicket},
    },
};

/// A single ticket row to insert
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub id: Uuid,
    pub event_id: i64,
    pub price: Decimal,
    pub ticket_type: TicketType,
    pub seat_number: String,
}

impl Entity for Ticket {
    type Id = Uuid;
    type Query = TicketQuery;
    type Create = NewTicket;
    type Update = UpdateTicket;

    const TABLE: &'static str = "tickets";
    const NAME: &'static str = "Ticket";
    const SORTABLE: &'static [SortField] = &[
        SortField::column("id"),
        SortField::column("event_id"),
        SortField::new("eventId", "event_id"),
        SortField::column("order_id"),
        SortField::new("orderId", "order_id"),
        SortField::column("price"),
        SortField::column("type"),
        SortField::column("seat_number"),
        SortField::new("seatNumber", "seat_number"),
        SortField::column("created_at"),
    ];

    fn insert_values(data: &NewTicket) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", data.id.into()),
            ("event_id", data.event_id.into()),
            ("price", data.price.into()),
            ("type", data.ticket_type.into()),
            ("seat_number", data.seat_number.as_str().into()),
        ]
    }

    fn update_values(data: &UpdateTicket) -> Vec<(&'static str, SqlValue)> {
        let mut values = Vec::new();
        if let Some(event_id) = data.event_id {
            values.push(("event_id", event_id.into()));
        }
        if let Some(price) = data.price {
            values.push(("price", price.into()));
        }
        if let Some(ticket_type) = data.ticket_type {
            values.push(("type", ticket_type.into()));
        }
        if let Some(ref seat_number) = data.seat_number {
            values.push(("seat_number", seat_number.trim().into()));
        }
        values
    }
}

#[derive(Clone)]
pub struct TicketsRepository {
    inner: PgRepository<Ticket>,
}

impl TicketsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            inner: PgRepository::new(pool),
        }
    }

    fn pool(&self) -> &Pool<Postgres> {
        self.inner.pool()
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Ticket> {
        self.inner.get_by_id(&id).await
    }

    /// Update a ticket under a row lock.
    ///
    /// Moving it to another event counts against that event's venue
    /// capacity. Sold tickets keep their event and price.
    pub async fn update(&self, id: Uuid, data: &UpdateTicket) -> AppResult<Ticket> {
        let mut tx = self.pool().begin().await?;

        let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Ticket::not_found(&id))?;

        if let Some(order_id) = ticket.order_id {
            if changes_sale_terms(&ticket, data) {
                return Err(AppError::Conflict(format!(
                    "Ticket {} belongs to order {}; event and price cannot change",
                    id, order_id
                )));
            }
        }

        if let Some(event_id) = data.event_id.filter(|e| *e != ticket.event_id) {
            let capacity = lock_event_capacity(&mut tx, event_id)
                .await?
                .ok_or_else(|| AppError::Validation(format!("Event {} not found", event_id)))?;
            let issued = count_for_event(&mut *tx, event_id).await?;
            if issued + 1 > i64::from(capacity) {
                return Err(AppError::Validation(format!(
                    "Venue capacity exceeded: {} of {} seats already issued",
                    issued, capacity
                )));
            }
        }

        let updated = update_row::<Ticket, _>(&mut *tx, &id, Ticket::update_values(data)).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a ticket that no order holds
    pub async fn delete_unsold(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1 AND order_id IS NULL")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.inner.get_by_id(&id).await?.order_id {
            Some(order_id) => Err(AppError::Conflict(format!(
                "Ticket {} belongs to order {}",
                id, order_id
            ))),
            // Held by an order that was cancelled in between
            None => self.inner.delete(&id).await,
        }
    }

    pub async fn list(&self, query: &TicketQuery) -> AppResult<(Vec<Ticket>, i64)> {
        self.inner.get_paginated(query).await
    }

    /// Issue `count` tickets for an event in one transaction.
    ///
    /// The event row is locked while issuing so concurrent batches for the
    /// same event see each other's seats. Fails with `Validation` when the
    /// venue capacity would be exceeded.
    pub async fn issue(&self, request: &CreateTicket) -> AppResult<Vec<Ticket>> {
        let mut tx = self.pool().begin().await?;

        let capacity = lock_event_capacity(&mut tx, request.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", request.event_id)))?;

        let issued = count_for_event(&mut *tx, request.event_id).await?;
        if issued + request.count > i64::from(capacity) {
            return Err(AppError::Validation(format!(
                "Venue capacity exceeded: {} of {} seats already issued",
                issued, capacity
            )));
        }

        // Continue after the highest seat carrying this type's prefix, whatever
        // the current type of that row
        let last_seat: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(CAST(SUBSTRING(seat_number FROM '[0-9]+$') AS BIGINT)), 0)
            FROM tickets
            WHERE event_id = $1 AND seat_number LIKE $2
            "#,
        )
        .bind(request.event_id)
        .bind(seat_pattern(request.ticket_type))
        .fetch_one(&mut *tx)
        .await?;

        let mut tickets = Vec::with_capacity(request.count as usize);
        for n in 1..=request.count {
            let ticket = NewTicket {
                id: Uuid::new_v4(),
                event_id: request.event_id,
                price: request.price,
                ticket_type: request.ticket_type,
                seat_number: request.ticket_type.seat_number(last_seat + n),
            };
            tickets.push(insert_row::<Ticket, _>(&mut *tx, Ticket::insert_values(&ticket)).await?);
        }

        tx.commit().await?;
        Ok(tickets)
    }

    /// Tickets held by an order
    pub async fn get_by_order(&self, order_id: i64) -> AppResult<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE order_id = $1 ORDER BY seat_number",
        )
        .bind(order_id)
        .fetch_all(self.pool())
        .await?;
        Ok(tickets)
    }
}

/// Lock an event row and read its venue's capacity; `None` if the event is missing.
///
/// Capacity is read in its own statement so it reflects venue updates
/// committed while waiting for the lock.
pub(crate) async fn lock_event_capacity(
    tx: &mut Transaction<'_, Postgres>,
    event_id: i64,
) -> AppResult<Option<i32>> {
    let venue_id: Option<i64> =
        sqlx::query_scalar("SELECT venue_id FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut **tx)
            .await?;
    let Some(venue_id) = venue_id else {
        return Ok(None);
    };

    let capacity: i32 = sqlx::query_scalar("SELECT capacity FROM venues WHERE id = $1")
        .bind(venue_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(Some(capacity))
}

/// Number of tickets issued for an event
pub(crate) async fn count_for_event<'c, X>(executor: X, event_id: i64) -> AppResult<i64>
where
    X: Executor<'c, Database = Postgres>,
{
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// LIKE pattern matching generated seat numbers of a type
fn seat_pattern(ticket_type: TicketType) -> String {
    format!("{}-%", ticket_type.seat_prefix())
}

/// True when an update would move a ticket or change what its buyer paid
fn changes_sale_terms(ticket: &Ticket, data: &UpdateTicket) -> bool {
    data.event_id.is_some_and(|e| e != ticket.event_id)
        || data.price.is_some_and(|p| p != ticket.price)
}
