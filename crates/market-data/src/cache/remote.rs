use std::time::Duration;

use async_trait::async_trait;
use log::info;
use redis::aio::ConnectionManager;

use super::CacheStore;
use crate::errors::CacheError;

/// Upper bound on any single Redis round trip.
const COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// Shared store backed by Redis, for multi-instance deployments.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(Duration::from_secs(3), client.get_connection_manager())
            .await
            .map_err(|_| CacheError::Backend(format!("timed out connecting to {}", url)))??;
        info!("Connected to Redis cache");
        Ok(Self {
            conn,
            prefix: "hermes:".to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn run<T: redis::FromRedisValue>(&self, cmd: redis::Cmd) -> Result<T, CacheError> {
        let mut conn = self.conn.clone();
        tokio::time::timeout(COMMAND_TIMEOUT, cmd.query_async(&mut conn))
            .await
            .map_err(|_| CacheError::Backend("redis command timed out".to_string()))?
            .map_err(CacheError::from)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(self.key(key));
        self.run(cmd).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let millis = ttl.as_millis().max(1) as u64;
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key(key)).arg(value).arg("PX").arg(millis);
        self.run(cmd).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(self.key(key));
        let _removed: i64 = self.run(cmd).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let _pong: String = self.run(redis::cmd("PING")).await?;
        Ok(())
    }
}
