//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::{Config, SessionConfig};
use crate::errors::AppResult;
use crate::infra::{mailer, Cache, Database, DependencyProbe, RedisSessionStore, SessionStore};
use crate::services::{ServiceContainer, Services};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    pub sessions: Arc<dyn SessionStore>,
    pub session_config: SessionConfig,
    /// Checked by `/health`
    pub probes: Vec<Arc<dyn DependencyProbe>>,
    /// Browser origin allowed to call the API with credentials
    pub allowed_origin: Option<String>,
}

impl AppState {
    /// Wire production state from live connections.
    pub fn from_config(database: Database, cache: Cache, config: &Config) -> AppResult<Self> {
        let mailer = mailer::from_config(&config.mail)?;
        let services = Services::from_connection(database.get_connection(), mailer, config);
        let sessions = RedisSessionStore::new(cache.clone(), config.session.ttl_seconds);
        let probes: Vec<Arc<dyn DependencyProbe>> = vec![Arc::new(database), Arc::new(cache)];

        Ok(Self {
            services: Arc::new(services),
            sessions: Arc::new(sessions),
            session_config: config.session.clone(),
            probes,
            allowed_origin: Some(config.frontend_url.clone()),
        })
    }

    /// Create state from already-built parts.
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        sessions: Arc<dyn SessionStore>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            services,
            sessions,
            session_config,
            probes: Vec::new(),
            allowed_origin: None,
        }
    }

    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = Some(origin.into());
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn DependencyProbe>) -> Self {
        self.probes.push(probe);
        self
    }
}
