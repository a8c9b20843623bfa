//! Role lookups.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};

use super::entities::role::Entity as RoleEntity;
use crate::domain::Role;
use crate::errors::AppResult;
use crate::infra::unit_of_work::bounded;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Read-only access to role reference data.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>>;
}

/// Concrete implementation of RoleRepository
pub struct RoleStore {
    db: DatabaseConnection,
    query_timeout: Duration,
}

impl RoleStore {
    pub fn new(db: DatabaseConnection, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }
}

#[async_trait]
impl RoleRepository for RoleStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>> {
        let model = bounded(self.query_timeout, RoleEntity::find_by_id(id).one(&self.db)).await?;
        Ok(model.map(Role::from))
    }
}
