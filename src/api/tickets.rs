//! Ticket endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        ticket::{CreateTicket, Ticket, TicketQuery, UpdateTicket},
        ListQuery,
    },
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, ListResponse, PaginatedResponse};

/// List tickets with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/tickets",
    tag = "tickets",
    params(TicketQuery),
    responses(
        (status = 200, description = "Page of tickets", body = PaginatedResponse<Ticket>),
        (status = 400, description = "Malformed query", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<TicketQuery>, AppError>,
) -> AppResult<Json<PaginatedResponse<Ticket>>> {
    let (tickets, total) = state.services.tickets.list(&query).await?;
    Ok(Json(PaginatedResponse::new(tickets, query.pagination(), total)))
}

/// Get a ticket by ID
#[utoipa::path(
    get,
    path = "/tickets/{id}",
    tag = "tickets",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket", body = ApiResponse<Ticket>),
        (status = 404, description = "Ticket not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<ApiResponse<Ticket>>> {
    let ticket = state.services.tickets.get_by_id(id).await?;
    Ok(Json(ApiResponse::new(ticket)))
}

/// Issue a batch of tickets for an event (admin)
#[utoipa::path(
    post,
    path = "/tickets",
    tag = "tickets",
    security(("bearer_auth" = [])),
    request_body = CreateTicket,
    responses(
        (status = 201, description = "Tickets issued", body = ListResponse<Ticket>),
        (status = 400, description = "Invalid input, unknown event or capacity exceeded", body = crate::error::ErrorResponse),
        (status = 409, description = "Seat numbers already issued", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_tickets(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<CreateTicket>, AppError>,
) -> AppResult<(StatusCode, Json<ListResponse<Ticket>>)> {
    claims.require_admin()?;
    request.validate()?;

    let tickets = state.services.tickets.issue(&request).await?;
    Ok((StatusCode::CREATED, Json(ListResponse { data: tickets })))
}

/// Update a ticket (admin)
#[utoipa::path(
    put,
    path = "/tickets/{id}",
    tag = "tickets",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = UpdateTicket,
    responses(
        (status = 200, description = "Ticket updated", body = ApiResponse<Ticket>),
        (status = 400, description = "Unknown event or capacity exceeded", body = crate::error::ErrorResponse),
        (status = 404, description = "Ticket not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Seat number taken, or sold ticket moved or repriced", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_ticket(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(data), _): WithRejection<Json<UpdateTicket>, AppError>,
) -> AppResult<Json<ApiResponse<Ticket>>> {
    claims.require_admin()?;
    data.validate()?;

    let ticket = state.services.tickets.update(id, &data).await?;
    Ok(Json(ApiResponse::new(ticket)))
}

/// Delete an unsold ticket (admin)
#[utoipa::path(
    delete,
    path = "/tickets/{id}",
    tag = "tickets",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 204, description = "Ticket deleted"),
        (status = 404, description = "Ticket not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Ticket belongs to an order", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_ticket(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.tickets.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
