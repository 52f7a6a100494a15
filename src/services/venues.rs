//! Venues service

use crate::{
    error::AppResult,
    models::venue::{CreateVenue, UpdateVenue, Venue, VenueQuery},
    repository::{Crud, Entity, Repository},
    services::cache::CacheService,
};

#[derive(Clone)]
pub struct VenuesService {
    repository: Repository,
    cache: CacheService,
}

impl VenuesService {
    pub fn new(repository: Repository, cache: CacheService) -> Self {
        Self { repository, cache }
    }

    pub async fn list(&self, query: &VenueQuery) -> AppResult<(Vec<Venue>, i64)> {
        self.cache
            .get_or_load_list(Venue::TABLE, query, || {
                self.repository.venues.get_paginated(query)
            })
            .await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Venue> {
        let key = CacheService::entity_key(Venue::TABLE, id);
        self.cache
            .get_or_load(&key, || self.repository.venues.get_by_id(&id))
            .await
    }

    pub async fn create(&self, data: &CreateVenue) -> AppResult<Venue> {
        let venue = self.repository.venues.create(data).await?;
        tracing::info!("Created venue {}", venue.id);
        Ok(venue)
    }

    pub async fn update(&self, id: i64, data: &UpdateVenue) -> AppResult<Venue> {
        let venue = self.repository.venues.update_within_capacity(id, data).await?;
        self.cache.invalidate(&CacheService::entity_key(Venue::TABLE, id)).await;
        Ok(venue)
    }

    /// Venues still hosting events cannot be deleted
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository
            .venues
            .delete(&id)
            .await
            .map_err(|e| e.on_foreign_key_violation("Venue still has events"))?;
        self.cache.invalidate(&CacheService::entity_key(Venue::TABLE, id)).await;
        Ok(())
    }
}
