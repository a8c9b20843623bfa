//! Service Container - Centralized service access.
//!
//! Handlers depend on the `ServiceContainer` trait, never on concrete
//! service types, so tests can swap in fakes.

use std::sync::Arc;

use super::{AccountLifecycle, AccountService, LifecycleSettings};
use crate::config::Config;
use crate::infra::{Mailer, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get account lifecycle service
    fn accounts(&self) -> Arc<dyn AccountService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    account_service: Arc<dyn AccountService>,
}

impl Services {
    pub fn new(account_service: Arc<dyn AccountService>) -> Self {
        Self { account_service }
    }

    /// Wire the services over a database connection and a mailer.
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        mailer: Arc<dyn Mailer>,
        config: &Config,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db, config.query_timeout));
        let account_service = Arc::new(AccountLifecycle::new(
            uow,
            mailer,
            LifecycleSettings::from_config(config),
        ));

        Self { account_service }
    }
}

impl ServiceContainer for Services {
    fn accounts(&self) -> Arc<dyn AccountService> {
        self.account_service.clone()
    }
}
