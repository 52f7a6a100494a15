//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{events, health, orders, tickets, users, venues};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ticketing API",
        version = "1.0.0",
        description = "Event ticketing platform REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::register,
        users::login,
        users::refresh_token,
        users::get_profile,
        users::update_profile,
        users::search_users,
        users::forgot_password,
        users::reset_password,
        // Venues
        venues::list_venues,
        venues::get_venue,
        venues::create_venue,
        venues::update_venue,
        venues::delete_venue,
        // Events
        events::list_events,
        events::get_event,
        events::create_event,
        events::update_event,
        events::delete_event,
        // Tickets
        tickets::list_tickets,
        tickets::get_ticket,
        tickets::create_tickets,
        tickets::update_ticket,
        tickets::delete_ticket,
        // Orders
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
    ),
    components(
        schemas(
            // Users
            crate::models::user::Role,
            crate::models::user::UserResponse,
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::UpdateProfile,
            crate::models::user::RefreshTokenRequest,
            crate::models::user::ForgotPasswordRequest,
            crate::models::user::ResetPasswordRequest,
            crate::models::user::TokenResponse,
            // Venues
            crate::models::venue::Venue,
            crate::models::venue::CreateVenue,
            crate::models::venue::UpdateVenue,
            // Events
            crate::models::event::Event,
            crate::models::event::CreateEvent,
            crate::models::event::UpdateEvent,
            // Tickets
            crate::models::ticket::Ticket,
            crate::models::ticket::TicketType,
            crate::models::ticket::CreateTicket,
            crate::models::ticket::UpdateTicket,
            // Orders
            crate::models::order::Order,
            crate::models::order::OrderStatus,
            crate::models::order::OrderDetails,
            crate::models::order::CreateOrder,
            crate::models::order::UpdateOrder,
            // Envelopes
            crate::models::query::PageMetadata,
            crate::api::MessageResponse,
            health::HealthResponse,
            // Errors
            crate::error::ErrorCode,
            crate::error::ErrorBody,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Accounts and authentication"),
        (name = "venues", description = "Venue management"),
        (name = "events", description = "Event catalog"),
        (name = "tickets", description = "Ticket issuance"),
        (name = "orders", description = "Ticket orders")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_security() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for path in ["/venues", "/events/{id}", "/tickets", "/orders/{id}", "/users/login"] {
            assert!(paths.iter().any(|p| p == path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
