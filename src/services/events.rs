//! Events service

use crate::{
    error::{AppError, AppResult},
    models::event::{CreateEvent, Event, EventQuery, UpdateEvent},
    repository::{Crud, Entity, Repository},
    services::cache::CacheService,
};

#[derive(Clone)]
pub struct EventsService {
    repository: Repository,
    cache: CacheService,
}

impl EventsService {
    pub fn new(repository: Repository, cache: CacheService) -> Self {
        Self { repository, cache }
    }

    pub async fn list(&self, query: &EventQuery) -> AppResult<(Vec<Event>, i64)> {
        self.cache
            .get_or_load_list(Event::TABLE, query, || {
                self.repository.events.get_paginated(query)
            })
            .await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Event> {
        let key = CacheService::entity_key(Event::TABLE, id);
        self.cache
            .get_or_load(&key, || self.repository.events.get_by_id(&id))
            .await
    }

    pub async fn create(&self, data: &CreateEvent) -> AppResult<Event> {
        self.ensure_venue(data.venue_id).await?;
        let event = self.repository.events.create(data).await?;
        tracing::info!("Created event {} at venue {}", event.id, event.venue_id);
        Ok(event)
    }

    pub async fn update(&self, id: i64, data: &UpdateEvent) -> AppResult<Event> {
        let event = self.repository.events.update_within_capacity(id, data).await?;
        self.cache.invalidate(&CacheService::entity_key(Event::TABLE, id)).await;
        Ok(event)
    }

    /// Events with issued tickets cannot be deleted
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository
            .events
            .delete(&id)
            .await
            .map_err(|e| e.on_foreign_key_violation("Event still has tickets"))?;
        self.cache.invalidate(&CacheService::entity_key(Event::TABLE, id)).await;
        Ok(())
    }

    async fn ensure_venue(&self, venue_id: i64) -> AppResult<()> {
        match self.repository.venues.get_by_id(&venue_id).await {
            Ok(_) => Ok(()),
            Err(AppError::NotFound(msg)) => Err(AppError::Validation(msg)),
            Err(e) => Err(e),
        }
    }
}
