//! Tickets service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::ticket::{CreateTicket, Ticket, TicketQuery, UpdateTicket},
    repository::Repository,
};

#[derive(Clone)]
pub struct TicketsService {
    repository: Repository,
}

impl TicketsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &TicketQuery) -> AppResult<(Vec<Ticket>, i64)> {
        self.repository.tickets.list(query).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Ticket> {
        self.repository.tickets.get_by_id(id).await
    }

    /// Issue a batch of numbered tickets for an event
    pub async fn issue(&self, request: &CreateTicket) -> AppResult<Vec<Ticket>> {
        let tickets = self
            .repository
            .tickets
            .issue(request)
            .await
            .map_err(|e| match e {
                AppError::NotFound(msg) => AppError::Validation(msg),
                other => other.on_unique_violation("Seat numbers already issued for this event"),
            })?;

        tracing::info!(
            "Issued {} {} tickets for event {}",
            tickets.len(),
            request.ticket_type,
            request.event_id
        );
        Ok(tickets)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateTicket) -> AppResult<Ticket> {
        self.repository
            .tickets
            .update(id, data)
            .await
            .map_err(|e| e.on_unique_violation("Seat number already taken for this event"))
    }

    /// Sold tickets stay until their order is cancelled
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.tickets.delete_unsold(id).await
    }
}
