//! Cache-aside layer in front of the catalog reads
//!
//! The cache is best-effort. A failing or unreachable store never fails a
//! request: lookups degrade to a miss and writes are dropped, both with a
//! `warn!` line.

use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{config::CacheConfig, error::AppResult};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw key/value storage behind [`CacheService`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Redis store over a self-reconnecting multiplexed connection
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect and check the server answers `PING`
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;

        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

/// Store used when caching is turned off; every read is a miss
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCacheStore;

#[async_trait]
impl CacheStore for DisabledCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Outcome of a cache read
#[derive(Debug)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
    Error(CacheError),
}

#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledCacheStore), Duration::from_secs(0))
    }

    /// Build the service from configuration, falling back to a disabled
    /// cache when Redis cannot be reached
    pub async fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            tracing::info!("Cache disabled by configuration");
            return Self::disabled();
        }

        match RedisCacheStore::connect(&config.url).await {
            Ok(store) => {
                tracing::info!("Connected to Redis cache");
                Self::new(Arc::new(store), Duration::from_secs(config.ttl_seconds))
            }
            Err(e) => {
                tracing::warn!("Redis unavailable, running without cache: {}", e);
                Self::disabled()
            }
        }
    }

    /// `<table>:<id>`
    pub fn entity_key(table: &str, id: impl Display) -> String {
        format!("{}:{}", table, id)
    }

    /// `<table>:list:<sha256 of the serialized query options>`
    pub fn list_key<Q: Serialize>(table: &str, query: &Q) -> Result<String, CacheError> {
        let encoded = serde_json::to_vec(query)?;
        let digest = Sha256::digest(&encoded);
        Ok(format!("{}:list:{}", table, hex::encode(digest)))
    }

    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => CacheLookup::Hit(value),
                Err(e) => CacheLookup::Error(e.into()),
            },
            Ok(None) => CacheLookup::Miss,
            Err(e) => CacheLookup::Error(e),
        }
    }

    pub async fn store<T: Serialize>(&self, key: &str, value: &T) {
        let result = match serde_json::to_vec(value) {
            Ok(bytes) => self.store.set(key, bytes, self.ttl).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!("Cache write for {} failed: {}", key, e);
        }
    }

    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!("Cache eviction of {} failed: {}", key, e);
        }
    }

    /// Serve `key` from the cache, or run `load` and populate the cache with its result
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match self.lookup::<T>(key).await {
            CacheLookup::Hit(value) => {
                tracing::debug!("Cache hit: {}", key);
                return Ok(value);
            }
            CacheLookup::Miss => tracing::debug!("Cache miss: {}", key),
            CacheLookup::Error(e) => tracing::warn!("Cache read for {} failed: {}", key, e),
        }

        let value = load().await?;
        self.store(key, &value).await;
        Ok(value)
    }

    /// [`get_or_load`](Self::get_or_load) keyed by a hash of the query options
    pub async fn get_or_load_list<Q, T, F, Fut>(&self, table: &str, query: &Q, load: F) -> AppResult<T>
    where
        Q: Serialize,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match Self::list_key(table, query) {
            Ok(key) => self.get_or_load(&key, load).await,
            Err(e) => {
                tracing::warn!("Cannot build cache key for {} listing: {}", table, e);
                load().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use crate::error::AppError;
    use crate::models::event::EventQuery;

    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl CacheStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn redis_down() -> CacheError {
        CacheError::Redis(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection refused",
        )))
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = CacheService::new(Arc::new(MemoryStore::default()), Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Vec<String> = cache
                .get_or_load("venues:1", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["Grand Hall".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["Grand Hall".to_string()]);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let cache = CacheService::new(Arc::new(MemoryStore::default()), Duration::from_secs(60));
        cache.store("events:7", &"old").await;
        cache.invalidate("events:7").await;

        assert!(matches!(cache.lookup::<String>("events:7").await, CacheLookup::Miss));
    }

    #[tokio::test]
    async fn test_store_error_is_a_miss() {
        let mut store = MockCacheStore::new();
        store.expect_get().returning(|_| Err(redis_down()));
        store.expect_set().returning(|_, _, _| Err(redis_down()));

        let cache = CacheService::new(Arc::new(store), Duration::from_secs(60));
        assert!(matches!(cache.lookup::<i64>("events:1").await, CacheLookup::Error(_)));

        let value = cache.get_or_load("events:1", || async { Ok(42_i64) }).await;
        tokio_test::assert_ok!(&value);
        assert_eq!(value.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let mut store = MockCacheStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_set().never();

        let cache = CacheService::new(Arc::new(store), Duration::from_secs(60));
        let result: AppResult<i64> = cache
            .get_or_load("events:9", || async { Err(AppError::NotFound("Event 9 not found".into())) })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_an_error() {
        let mut store = MockCacheStore::new();
        store.expect_get().returning(|_| Ok(Some(b"not json".to_vec())));

        let cache = CacheService::new(Arc::new(store), Duration::from_secs(60));
        assert!(matches!(
            cache.lookup::<i64>("venues:3").await,
            CacheLookup::Error(CacheError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_disabled_cache_always_loads() {
        let cache = CacheService::disabled();
        let loads = AtomicUsize::new(0);
        for _ in 0..2 {
            cache
                .get_or_load("venues:1", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(1_i32)
                })
                .await
                .unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_keys() {
        assert_eq!(CacheService::entity_key("events", 12), "events:12");

        let a = EventQuery {
            name: Some("jazz".to_string()),
            ..Default::default()
        };
        let b = EventQuery {
            name: Some("rock".to_string()),
            ..Default::default()
        };
        let key_a = CacheService::list_key("events", &a).unwrap();
        assert!(key_a.starts_with("events:list:"));
        assert_eq!(key_a.len(), "events:list:".len() + 64);
        assert_eq!(key_a, CacheService::list_key("events", &a).unwrap());
        assert_ne!(key_a, CacheService::list_key("events", &b).unwrap());
    }
}
