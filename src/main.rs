//! Ticketing Server - event ticketing REST API

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketing_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::{cache::CacheService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    tracing::info!("Starting Ticketing Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let cache = CacheService::from_config(&config.cache).await;

    let repository = Repository::new(pool.clone());
    let services = Services::new(repository, &config, cache);

    let state = AppState {
        services: Arc::new(services),
        pool,
    };

    let app = create_router(state);

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ticketing_server={},tower_http=debug", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Users
        .route(
            "/users",
            get(api::users::get_profile)
                .post(api::users::register)
                .put(api::users::update_profile),
        )
        .route("/users/search", get(api::users::search_users))
        .route("/users/login", post(api::users::login))
        .route("/users/refresh", post(api::users::refresh_token))
        .route("/users/forgot-password", post(api::users::forgot_password))
        .route("/users/reset-password", post(api::users::reset_password))
        // Venues
        .route(
            "/venues",
            get(api::venues::list_venues).post(api::venues::create_venue),
        )
        .route(
            "/venues/:id",
            get(api::venues::get_venue)
                .put(api::venues::update_venue)
                .delete(api::venues::delete_venue),
        )
        // Events
        .route(
            "/events",
            get(api::events::list_events).post(api::events::create_event),
        )
        .route(
            "/events/:id",
            get(api::events::get_event)
                .put(api::events::update_event)
                .delete(api::events::delete_event),
        )
        // Tickets
        .route(
            "/tickets",
            get(api::tickets::list_tickets).post(api::tickets::create_tickets),
        )
        .route(
            "/tickets/:id",
            get(api::tickets::get_ticket)
                .put(api::tickets::update_ticket)
                .delete(api::tickets::delete_ticket),
        )
        // Orders
        .route(
            "/orders",
            get(api::orders::list_orders).post(api::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(api::orders::get_order).put(api::orders::update_order),
        )
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
