//! Venue endpoints

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
        venue::{CreateVenue, UpdateVenue, Venue, VenueQuery},
        ListQuery,
    },
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, PaginatedResponse};

/// List venues with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/venues",
    tag = "venues",
    params(VenueQuery),
    responses(
        (status = 200, description = "Page of venues", body = PaginatedResponse<Venue>),
        (status = 400, description = "Malformed query", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_venues(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<VenueQuery>, AppError>,
) -> AppResult<Json<PaginatedResponse<Venue>>> {
    let (venues, total) = state.services.venues.list(&query).await?;
    Ok(Json(PaginatedResponse::new(venues, query.pagination(), total)))
}

/// Get a venue by ID
#[utoipa::path(
    get,
    path = "/venues/{id}",
    tag = "venues",
    params(("id" = i64, Path, description = "Venue ID")),
    responses(
        (status = 200, description = "Venue", body = ApiResponse<Venue>),
        (status = 404, description = "Venue not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_venue(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<ApiResponse<Venue>>> {
    let venue = state.services.venues.get_by_id(id).await?;
    Ok(Json(ApiResponse::new(venue)))
}

/// Create a venue (admin)
#[utoipa::path(
    post,
    path = "/venues",
    tag = "venues",
    security(("bearer_auth" = [])),
    request_body = CreateVenue,
    responses(
        (status = 201, description = "Venue created", body = ApiResponse<Venue>),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_venue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(data), _): WithRejection<Json<CreateVenue>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<Venue>>)> {
    claims.require_admin()?;
    data.validate()?;

    let venue = state.services.venues.create(&data).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(venue))))
}

/// Update a venue (admin)
#[utoipa::path(
    put,
    path = "/venues/{id}",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Venue ID")),
    request_body = UpdateVenue,
    responses(
        (status = 200, description = "Venue updated", body = ApiResponse<Venue>),
        (status = 400, description = "Invalid input or capacity below issued tickets", body = crate::error::ErrorResponse),
        (status = 404, description = "Venue not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_venue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(data), _): WithRejection<Json<UpdateVenue>, AppError>,
) -> AppResult<Json<ApiResponse<Venue>>> {
    claims.require_admin()?;
    data.validate()?;

    let venue = state.services.venues.update(id, &data).await?;
    Ok(Json(ApiResponse::new(venue)))
}

/// Delete a venue (admin)
#[utoipa::path(
    delete,
    path = "/venues/{id}",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Venue ID")),
    responses(
        (status = 204, description = "Venue deleted"),
        (status = 404, description = "Venue not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Venue still has events", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_venue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.venues.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
