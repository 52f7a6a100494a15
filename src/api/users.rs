//! Account endpoints: registration, login, tokens, profile and password reset

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{
            ForgotPasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
            ResetPasswordRequest, TokenResponse, UpdateProfile, UserQuery, UserResponse,
        },
        ListQuery,
    },
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse};

/// Register a new buyer account
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    request.validate()?;

    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(user.into()))))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    request.validate()?;

    let tokens = state.services.users.login(&request).await?;
    Ok(Json(ApiResponse::new(tokens)))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/users/refresh",
    tag = "users",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token pair", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid refresh token", body = crate::error::ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<RefreshTokenRequest>, AppError>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    request.validate()?;

    let tokens = state.services.users.refresh(&request.refresh_token).await?;
    Ok(Json(ApiResponse::new(tokens)))
}

/// Get own profile
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state.services.users.get_profile(claims.user_id()).await?;
    Ok(Json(ApiResponse::new(user.into())))
}

/// Update own profile
#[utoipa::path(
    put,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Wrong current password", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(profile), _): WithRejection<Json<UpdateProfile>, AppError>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    profile.validate()?;

    let user = state
        .services
        .users
        .update_profile(claims.user_id(), profile)
        .await?;
    Ok(Json(ApiResponse::new(user.into())))
}

/// Search accounts (admin)
#[utoipa::path(
    get,
    path = "/users/search",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Page of users", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Query(query), _): WithRejection<Query<UserQuery>, AppError>,
) -> AppResult<Json<PaginatedResponse<UserResponse>>> {
    claims.require_admin()?;

    let (users, total) = state.services.users.search(&query).await?;
    Ok(Json(PaginatedResponse::new(
        users.into_iter().map(UserResponse::from).collect(),
        query.pagination(),
        total,
    )))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/users/forgot-password",
    tag = "users",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset requested", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid email", body = crate::error::ErrorResponse)
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<ForgotPasswordRequest>, AppError>,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    request.validate()?;

    state.services.users.forgot_password(&request).await?;
    Ok(Json(ApiResponse::new(MessageResponse::new(
        "If the address is registered, a reset email has been sent",
    ))))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/users/reset-password",
    tag = "users",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid or expired token", body = crate::error::ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<ResetPasswordRequest>, AppError>,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    request.validate()?;

    state.services.users.reset_password(&request).await?;
    Ok(Json(ApiResponse::new(MessageResponse::new("Password has been reset"))))
}
