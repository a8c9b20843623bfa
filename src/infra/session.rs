//! Server-side session storage.
//!
//! A session is a flat string map keyed by an opaque id carried in a
//! cookie. Writes refresh the TTL; reads do not.

use async_trait::async_trait;

use super::cache::Cache;
use crate::config::CACHE_PREFIX_SESSION;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Backing store for session maps.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Merge fields into a session, creating it if needed.
    async fn put(&self, session_id: &str, fields: Vec<(String, String)>) -> AppResult<()>;

    /// Whether the store holds a live session under this id.
    async fn contains(&self, session_id: &str) -> AppResult<bool>;

    /// Read one field as a string.
    async fn get_string(&self, session_id: &str, key: &str) -> AppResult<Option<String>>;

    /// Whether a field is present at all.
    async fn exists(&self, session_id: &str, key: &str) -> AppResult<bool>;

    /// Drop the whole session.
    async fn clear(&self, session_id: &str) -> AppResult<()>;
}

/// Redis hash per session under `session:{id}`.
#[derive(Clone)]
pub struct RedisSessionStore {
    cache: Cache,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(cache: Cache, ttl_seconds: u64) -> Self {
        Self { cache, ttl_seconds }
    }

    fn key(session_id: &str) -> String {
        format!("{}{}", CACHE_PREFIX_SESSION, session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, session_id: &str, fields: Vec<(String, String)>) -> AppResult<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let pairs: Vec<(&str, &str)> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        self.cache
            .hset_with_ttl(&Self::key(session_id), &pairs, self.ttl_seconds)
            .await
    }

    async fn contains(&self, session_id: &str) -> AppResult<bool> {
        self.cache.exists(&Self::key(session_id)).await
    }

    async fn get_string(&self, session_id: &str, key: &str) -> AppResult<Option<String>> {
        self.cache.hget(&Self::key(session_id), key).await
    }

    async fn exists(&self, session_id: &str, key: &str) -> AppResult<bool> {
        self.cache.hexists(&Self::key(session_id), key).await
    }

    async fn clear(&self, session_id: &str) -> AppResult<()> {
        self.cache.delete(&Self::key(session_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_prefix() {
        assert_eq!(RedisSessionStore::key("abc"), "session:abc");
    }
}
