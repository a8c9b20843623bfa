//! Redis cache implementation.
//!
//! Thin wrapper over a pooled connection manager exposing the hash
//! operations the session store is built on.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use crate::config::Config;
use crate::errors::{AppError, AppResult};

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis.
    pub async fn connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }

    // =========================================================================
    // Hash Operations
    // =========================================================================

    /// Write hash fields and reset the key's TTL in one round trip.
    pub async fn hset_with_ttl(
        &self,
        key: &str,
        fields: &[(&str, &str)],
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let mut conn = self.connection.clone();

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(key, fields)
            .ignore()
            .expire(key, ttl_seconds as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok(())
    }

    /// Read one hash field.
    pub async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.hget(key, field).await.map_err(cache_error)?;
        Ok(value)
    }

    /// Check whether a hash field is present.
    pub async fn hexists(&self, key: &str, field: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.hexists(key, field).await.map_err(cache_error)?;
        Ok(exists)
    }

    /// Check whether a key exists (and has not expired).
    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await.map_err(cache_error)?;
        Ok(exists)
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await.map_err(cache_error)?;
        Ok(())
    }

    /// Round-trip a PING.
    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}
