//! Event endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        event::{CreateEvent, Event, EventQuery, UpdateEvent},
        ListQuery,
    },
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, PaginatedResponse};

/// List events with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    params(EventQuery),
    responses(
        (status = 200, description = "Page of events", body = PaginatedResponse<Event>),
        (status = 400, description = "Malformed query", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<EventQuery>, AppError>,
) -> AppResult<Json<PaginatedResponse<Event>>> {
    let (events, total) = state.services.events.list(&query).await?;
    Ok(Json(PaginatedResponse::new(events, query.pagination(), total)))
}

/// Get an event by ID
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event", body = ApiResponse<Event>),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<ApiResponse<Event>>> {
    let event = state.services.events.get_by_id(id).await?;
    Ok(Json(ApiResponse::new(event)))
}

/// Create an event (admin)
#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = ApiResponse<Event>),
        (status = 400, description = "Invalid input or unknown venue", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(data), _): WithRejection<Json<CreateEvent>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<Event>>)> {
    claims.require_admin()?;
    data.validate()?;

    let event = state.services.events.create(&data).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(event))))
}

/// Update an event (admin)
#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Event ID")),
    request_body = UpdateEvent,
    responses(
        (status = 200, description = "Event updated", body = ApiResponse<Event>),
        (status = 400, description = "Unknown venue or venue too small", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(data), _): WithRejection<Json<UpdateEvent>, AppError>,
) -> AppResult<Json<ApiResponse<Event>>> {
    claims.require_admin()?;
    data.validate()?;

    let event = state.services.events.update(id, &data).await?;
    Ok(Json(ApiResponse::new(event)))
}

/// Delete an event (admin)
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Event still has tickets", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.events.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
