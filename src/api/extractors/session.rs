//! Request-scoped session handle.
//!
//! Installed by the session layer; handlers and middleware extract it
//! like any other value. Writes go straight to the store, and the layer
//! reads the handle afterwards to decide what to do with the cookie.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::config::SESSION_ID_BYTES;
use crate::domain::token::random_hex;
use crate::errors::{AppError, AppResult};
use crate::infra::SessionStore;

/// What the response should do with the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieAction {
    Keep,
    Issue,
    Remove,
}

struct SessionInner {
    id: Mutex<String>,
    is_new: AtomicBool,
    store: Arc<dyn SessionStore>,
    written: AtomicBool,
    cleared: AtomicBool,
}

/// Handle to the current request's session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("is_new", &self.inner.is_new.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session named by the request's cookie. The store must already know it.
    pub fn resume(id: String, store: Arc<dyn SessionStore>) -> Self {
        Self::build(id, false, store)
    }

    /// Session with a freshly minted id; nothing is stored until a write.
    pub fn fresh(id: String, store: Arc<dyn SessionStore>) -> Self {
        Self::build(id, true, store)
    }

    /// New random session id, 64 lowercase hex characters.
    pub fn new_id() -> String {
        random_hex(SESSION_ID_BYTES)
    }

    fn build(id: String, is_new: bool, store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: Mutex::new(id),
                is_new: AtomicBool::new(is_new),
                store,
                written: AtomicBool::new(false),
                cleared: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> String {
        self.inner
            .id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Nothing can be stored under an id this request minted and never wrote.
    fn is_empty(&self) -> bool {
        (self.inner.is_new.load(Ordering::Acquire) && !self.inner.written.load(Ordering::Acquire))
            || self.inner.cleared.load(Ordering::Acquire)
    }

    pub async fn put(&self, fields: Vec<(String, String)>) -> AppResult<()> {
        self.inner.store.put(&self.id(), fields).await?;
        self.inner.cleared.store(false, Ordering::Release);
        self.inner.written.store(true, Ordering::Release);
        Ok(())
    }

    pub async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.inner.store.get_string(&self.id(), key).await
    }

    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        if self.is_empty() {
            return Ok(false);
        }
        self.inner.store.exists(&self.id(), key).await
    }

    /// Drop all server-side data and expire the cookie.
    pub async fn clear(&self) -> AppResult<()> {
        self.inner.store.clear(&self.id()).await?;
        self.inner.written.store(false, Ordering::Release);
        self.inner.cleared.store(true, Ordering::Release);
        Ok(())
    }

    /// Switch to a newly minted id, discarding anything stored under the old one.
    ///
    /// Call before writing a login so an id known to someone else before
    /// authentication never carries the principal.
    pub async fn rotate(&self) -> AppResult<()> {
        if !self.is_empty() {
            self.inner.store.clear(&self.id()).await?;
        }

        *self.inner.id.lock().unwrap_or_else(PoisonError::into_inner) = Self::new_id();
        self.inner.is_new.store(true, Ordering::Release);
        self.inner.written.store(false, Ordering::Release);
        self.inner.cleared.store(false, Ordering::Release);
        Ok(())
    }

    pub fn cookie_action(&self) -> CookieAction {
        if self.inner.written.load(Ordering::Acquire) {
            CookieAction::Issue
        } else if self.inner.cleared.load(Ordering::Acquire)
            && !self.inner.is_new.load(Ordering::Acquire)
        {
            CookieAction::Remove
        } else {
            CookieAction::Keep
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::internal("Session layer is not installed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MockSessionStore;

    #[tokio::test]
    async fn test_fresh_session_reads_skip_store() {
        let mut store = MockSessionStore::new();
        store.expect_get_string().never();
        store.expect_exists().never();

        let session = Session::fresh("new".into(), Arc::new(store));

        assert_eq!(session.get_string("userId").await.unwrap(), None);
        assert!(!session.exists("userId").await.unwrap());
        assert_eq!(session.cookie_action(), CookieAction::Keep);
    }

    #[tokio::test]
    async fn test_write_issues_cookie() {
        let mut store = MockSessionStore::new();
        store.expect_put().times(1).returning(|_, _| Ok(()));

        let session = Session::fresh("new".into(), Arc::new(store));
        session
            .put(vec![("userId".into(), "42".into())])
            .await
            .unwrap();

        assert_eq!(session.cookie_action(), CookieAction::Issue);
    }

    #[tokio::test]
    async fn test_clear_removes_cookie() {
        let mut store = MockSessionStore::new();
        store
            .expect_clear()
            .withf(|id| id == "existing")
            .times(1)
            .returning(|_| Ok(()));

        let session = Session::resume("existing".into(), Arc::new(store));
        session.clear().await.unwrap();

        assert_eq!(session.cookie_action(), CookieAction::Remove);
        assert!(!session.exists("userId").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_discards_old_id() {
        let mut store = MockSessionStore::new();
        store
            .expect_clear()
            .withf(|id| id == "existing")
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_put()
            .withf(|id, _| id != "existing" && id.len() == SESSION_ID_BYTES * 2)
            .times(1)
            .returning(|_, _| Ok(()));

        let session = Session::resume("existing".into(), Arc::new(store));
        session.rotate().await.unwrap();
        assert_ne!(session.id(), "existing");

        session
            .put(vec![("userId".into(), "42".into())])
            .await
            .unwrap();
        assert_eq!(session.cookie_action(), CookieAction::Issue);
    }

    #[tokio::test]
    async fn test_rotate_fresh_session_skips_store() {
        let mut store = MockSessionStore::new();
        store.expect_clear().never();

        let session = Session::fresh("minted".into(), Arc::new(store));
        session.rotate().await.unwrap();

        assert_ne!(session.id(), "minted");
        assert_eq!(session.cookie_action(), CookieAction::Keep);
    }

    #[tokio::test]
    async fn test_resumed_session_reads_store() {
        let mut store = MockSessionStore::new();
        store
            .expect_get_string()
            .returning(|_, _| Ok(Some("value".to_string())));

        let session = Session::resume("existing".into(), Arc::new(store));
        assert_eq!(
            session.get_string("userName").await.unwrap().as_deref(),
            Some("value")
        );
    }
}
