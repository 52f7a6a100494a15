//! Ticketing server
//!
//! REST JSON API for an event ticketing platform: accounts, venues, events,
//! ticket issuance and orders, backed by PostgreSQL with an optional Redis
//! read cache.

use std::sync::Arc;

use sqlx::PgPool;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
    /// Used by the readiness probe
    pub pool: PgPool,
}
