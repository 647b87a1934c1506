//! Key/value cache with per-entry TTL.
//!
//! [`Cache`] fronts an optional remote [`CacheStore`] (Redis) with a
//! process-local [`InMemoryStore`]. When no remote store is configured the
//! local map is the cache. When the remote store fails, the failing call is
//! served from the local map instead and a warning is logged; cache errors
//! never reach callers.

mod memory;
mod remote;

pub use memory::InMemoryStore;
pub use remote::RedisStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::CacheError;

/// A backing store for [`Cache`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name, reported on health checks.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

/// Health of the cache, as reported by [`Cache::status`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub backend: String,
    /// `None` when no remote store is configured.
    pub remote_reachable: Option<bool>,
}

pub struct Cache {
    local: InMemoryStore,
    remote: Option<Arc<dyn CacheStore>>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Cache {
    pub fn in_memory() -> Self {
        Self {
            local: InMemoryStore::new(),
            remote: None,
        }
    }

    pub fn with_remote(remote: Arc<dyn CacheStore>) -> Self {
        Self {
            local: InMemoryStore::new(),
            remote: Some(remote),
        }
    }

    /// Connects to Redis when a URL is given, falling back to the in-process
    /// map if the connection cannot be established.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        match redis_url {
            None => Self::in_memory(),
            Some(url) => match RedisStore::connect(url).await {
                Ok(store) => Self::with_remote(Arc::new(store)),
                Err(e) => {
                    warn!("Redis unavailable ({}), using in-memory cache", e);
                    Self::in_memory()
                }
            },
        }
    }

    pub fn backend(&self) -> &'static str {
        self.remote.as_ref().map_or("memory", |r| r.name())
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(remote) = &self.remote {
            match remote.get(key).await {
                Ok(value) => return value,
                Err(e) => warn!("Cache get '{}' failed on {}: {}", key, remote.name(), e),
            }
        }
        self.local.get_sync(key)
    }

    pub async fn set(&self, key: &str, value: String, ttl: Duration) {
        if let Some(remote) = &self.remote {
            match remote.set(key, value.clone(), ttl).await {
                Ok(()) => return,
                Err(e) => warn!("Cache set '{}' failed on {}: {}", key, remote.name(), e),
            }
        }
        self.local.set_sync(key, value, ttl);
    }

    pub async fn delete(&self, key: &str) {
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.delete(key).await {
                warn!("Cache delete '{}' failed on {}: {}", key, remote.name(), e);
            }
        }
        self.local.delete_sync(key);
    }

    /// Typed read. Entries that no longer deserialize are treated as absent.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Discarding undecodable cache entry '{}': {}", key, e);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, raw, ttl).await,
            Err(e) => warn!("Cache set '{}' skipped: {}", key, CacheError::from(e)),
        }
    }

    pub async fn status(&self) -> CacheStatus {
        let remote_reachable = match &self.remote {
            None => None,
            Some(remote) => Some(remote.ping().await.is_ok()),
        };
        CacheStatus {
            backend: self.backend().to_string(),
            remote_reachable,
        }
    }
}
