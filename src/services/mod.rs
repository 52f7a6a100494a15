//! Business logic services

pub mod cache;
pub mod email;
pub mod events;
pub mod orders;
pub mod tickets;
pub mod users;
pub mod venues;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub venues: venues::VenuesService,
    pub events: events::EventsService,
    pub tickets: tickets::TicketsService,
    pub orders: orders::OrdersService,
}

impl Services {
    /// Create all services with the given repository and cache
    pub fn new(repository: Repository, config: &AppConfig, cache: cache::CacheService) -> Self {
        let email = email::EmailService::new(config.email.clone());

        Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone(), email),
            venues: venues::VenuesService::new(repository.clone(), cache.clone()),
            events: events::EventsService::new(repository.clone(), cache),
            tickets: tickets::TicketsService::new(repository.clone()),
            orders: orders::OrdersService::new(repository),
        }
    }
}
