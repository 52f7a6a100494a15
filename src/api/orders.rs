//! Order endpoints

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
        order::{CreateOrder, Order, OrderDetails, OrderQuery, UpdateOrder},
        ListQuery,
    },
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, PaginatedResponse};

/// Order available tickets
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrder,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderDetails>),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Some tickets are unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<CreateOrder>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderDetails>>)> {
    request.validate()?;

    let details = state.services.orders.place(&claims, &request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(details))))
}

/// List orders; buyers only see their own
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(OrderQuery),
    responses(
        (status = 200, description = "Page of orders", body = PaginatedResponse<Order>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Query(query), _): WithRejection<Query<OrderQuery>, AppError>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    let (orders, total) = state.services.orders.list(&claims, &query).await?;
    Ok(Json(PaginatedResponse::new(orders, query.pagination(), total)))
}

/// Get an order with its tickets
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let details = state.services.orders.get(&claims, id).await?;
    Ok(Json(ApiResponse::new(details)))
}

/// Change an order's status
///
/// Administrators may mark pending orders paid or cancelled; owners may cancel.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order ID")),
    request_body = UpdateOrder,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderDetails>),
        (status = 403, description = "Status change not allowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Order is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_order(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateOrder>, AppError>,
) -> AppResult<Json<ApiResponse<OrderDetails>>> {
    let details = state
        .services
        .orders
        .update_status(&claims, id, &request)
        .await?;
    Ok(Json(ApiResponse::new(details)))
}
