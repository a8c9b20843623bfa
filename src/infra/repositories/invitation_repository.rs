//! Invitation housekeeping outside the activation path.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use super::entities::invitation;
use crate::errors::AppResult;
use crate::infra::unit_of_work::bounded;

/// Direct access to the invitations table for maintenance tasks.
pub struct InvitationStore {
    db: DatabaseConnection,
    query_timeout: Duration,
}

impl InvitationStore {
    pub fn new(db: DatabaseConnection, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }

    /// Delete invitations whose expiry is at or before `now`.
    ///
    /// Accounts left behind stay unverified and can ask for a new link.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = bounded(
            self.query_timeout,
            invitation::Entity::delete_many()
                .filter(invitation::Column::Expiry.lte(now))
                .exec(&self.db),
        )
        .await?;

        Ok(result.rows_affected)
    }
}
