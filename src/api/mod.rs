//! API handlers for the ticketing REST endpoints

pub mod events;
pub mod health;
pub mod openapi;
pub mod orders;
pub mod tickets;
pub mod users;
pub mod venues;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{query::Pagination, user::UserClaims, PageMetadata},
    AppState,
};

/// Extractor for the caller's access token claims
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("Missing or invalid authorization header".to_string()))?;

        let claims = state.services.users.authenticate(bearer.token())?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Success envelope: `{"data": ...}`
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub data: T,
}

impl<T> ApiResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Envelope for an unpaged list
#[derive(Serialize, ToSchema)]
pub struct ListResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub data: Vec<T>,
}

/// Envelope for a page of results with its paging metadata
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub data: Vec<T>,
    pub paging: PageMetadata,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(data: Vec<T>, pagination: Pagination, total: i64) -> Self {
        Self {
            data,
            paging: PageMetadata::new(pagination, total),
        }
    }
}

/// Plain message payload
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Venue;
    use chrono::Utc;

    #[test]
    fn test_paginated_envelope_shape() {
        let now = Utc::now();
        let venue = Venue {
            id: 1,
            name: "Grand Hall".to_string(),
            address: "1 Main St".to_string(),
            capacity: 300,
            city: "Bandung".to_string(),
            state: "West Java".to_string(),
            zip: "40111".to_string(),
            created_at: now,
            updated_at: now,
        };
        let body = PaginatedResponse::new(vec![venue], Pagination::normalize(Some(2), Some(1)), 3);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["data"][0]["name"], "Grand Hall");
        assert_eq!(json["paging"]["page"], 2);
        assert_eq!(json["paging"]["size"], 1);
        assert_eq!(json["paging"]["total_item"], 3);
        assert_eq!(json["paging"]["total_page"], 3);
    }
}
