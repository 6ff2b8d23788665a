//! TTL cache for normalized weather responses
//!
//! Two backends sit behind one front type: Redis when a connection URL is
//! configured and reachable, always backed by an in-process map. Backend
//! failures never surface to callers; a failed Redis operation falls back
//! to the in-process map and is only visible in logs.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Capability interface both cache backends implement
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set_bytes(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<()>;
}

struct StoredEntry {
    bytes: Vec<u8>,
    expires_at: u64, // Unix timestamp (seconds)
}

/// In-process map with per-entry expiry
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = now_unix();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => return Ok(Some(entry.bytes.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Entry expired: evict it, re-checking after the lock switch since
        // a concurrent set may have refreshed the key.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if now < entry.expires_at {
                return Ok(Some(entry.bytes.clone()));
            }
            entries.remove(key);
            debug!("Evicted expired cache entry: {}", key);
        }
        Ok(None)
    }

    async fn set_bytes(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<()> {
        let expires_at = now_unix().saturating_add(ttl.as_secs());
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), StoredEntry { bytes, expires_at });
        Ok(())
    }
}

/// Redis-backed cache using native key expiry
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Connect to Redis
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_bytes(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, bytes, ttl.as_secs()).await?;
        Ok(())
    }
}

/// Cache front used by the weather service
///
/// Values are stored as serialized JSON bytes; entries are immutable once
/// written and evicted only by TTL.
pub struct WeatherCache {
    redis: Option<RedisCache>,
    memory: MemoryCache,
}

impl WeatherCache {
    /// Build the cache, attaching Redis when a URL is configured
    ///
    /// An unreachable Redis downgrades to the in-process map with a
    /// warning; startup never fails on the cache.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let redis = match redis_url {
            Some(url) => match RedisCache::connect(url).await {
                Ok(redis) => {
                    info!("Connected to Redis cache");
                    Some(redis)
                }
                Err(e) => {
                    warn!("Redis connection failed, using in-memory cache: {}", e);
                    None
                }
            },
            None => None,
        };

        Self {
            redis,
            memory: MemoryCache::new(),
        }
    }

    /// Build a purely in-process cache
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            redis: None,
            memory: MemoryCache::new(),
        }
    }

    /// Retrieve a value if present and not expired
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(redis) = &self.redis {
            match redis.get_bytes(key).await {
                Ok(Some(bytes)) => return decode(key, &bytes),
                Ok(None) => {}
                Err(e) => warn!("Redis get failed, falling back to memory: {}", e),
            }
        }

        match self.memory.get_bytes(key).await {
            Ok(Some(bytes)) => decode(key, &bytes),
            Ok(None) => None,
            Err(e) => {
                warn!("Memory cache get failed: {}", e);
                None
            }
        }
    }

    /// Store a value with a time-to-live
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not serialize cache value for {}: {}", key, e);
                return;
            }
        };

        if let Some(redis) = &self.redis {
            match redis.set_bytes(key, bytes.clone(), ttl).await {
                Ok(()) => return,
                Err(e) => warn!("Redis set failed, falling back to memory: {}", e),
            }
        }

        if let Err(e) = self.memory.set_bytes(key, bytes, ttl).await {
            warn!("Memory cache set failed: {}", e);
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding undecodable cache entry {}: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let cache = WeatherCache::in_memory();
        cache
            .set("weather:24.7:46.7", &vec![1, 2, 3], Duration::from_secs(60))
            .await;

        let value: Option<Vec<i32>> = cache.get("weather:24.7:46.7").await;
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let cache = WeatherCache::in_memory();
        let value: Option<String> = cache.get("weather:0:0").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_read() {
        let memory = MemoryCache::new();
        memory
            .set_bytes("k", b"\"v\"".to_vec(), Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(memory.entry_count().await, 1);

        let value = memory.get_bytes("k").await.unwrap();
        assert!(value.is_none());
        assert_eq!(memory.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_entry() {
        let cache = WeatherCache::in_memory();
        cache.set("k", &"old", Duration::from_secs(60)).await;
        cache.set("k", &"new", Duration::from_secs(60)).await;

        let value: Option<String> = cache.get("k").await;
        assert_eq!(value.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_undecodable_entry_reads_as_miss() {
        let cache = WeatherCache::in_memory();
        cache.set("k", &"a string", Duration::from_secs(60)).await;

        // Stored as a JSON string; reading it as a number must not panic
        let value: Option<u64> = cache.get("k").await;
        assert!(value.is_none());
    }
}
