//! Account repository, generic over the account table.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Value};
use uuid::Uuid;

use super::account_table::AccountTable;
use crate::domain::{Account, AccountKind, NewAccount, NewInvitation};
use crate::errors::{AppError, AppResult};
use crate::infra::unit_of_work::bounded;
use crate::with_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account persistence for one account kind.
///
/// Lookups by email and username are exact-match. Multi-row writes run
/// in a single transaction.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Which table this repository serves
    fn kind(&self) -> AccountKind;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>>;

    /// Insert an unverified account and its invitation atomically.
    ///
    /// Fails with `DuplicateEmail` or `DuplicateUsername` and leaves nothing
    /// behind when a unique constraint is hit.
    async fn create_and_invite(
        &self,
        account: NewAccount,
        invitation: NewInvitation,
    ) -> AppResult<Account>;

    /// Consume a live invitation and mark its account verified.
    ///
    /// `NotFound` when the digest is unknown, expired, already consumed, or
    /// lost a race with a concurrent activation.
    async fn activate(&self, token_digest: &str) -> AppResult<Account>;

    /// Replace every invitation of an account with a new one.
    async fn reissue_invitation(&self, account_id: Uuid, invitation: NewInvitation)
        -> AppResult<()>;
}

/// Sea-ORM backed AccountRepository
pub struct AccountStore<T: AccountTable> {
    db: DatabaseConnection,
    query_timeout: Duration,
    _table: PhantomData<T>,
}

impl<T: AccountTable> AccountStore<T> {
    pub fn new(db: DatabaseConnection, query_timeout: Duration) -> Self {
        Self {
            db,
            query_timeout,
            _table: PhantomData,
        }
    }

    async fn find_one(
        &self,
        column: <T::Entity as EntityTrait>::Column,
        value: Value,
    ) -> AppResult<Option<Account>> {
        let model = bounded(
            self.query_timeout,
            T::Entity::find().filter(column.eq(value)).one(&self.db),
        )
        .await?;

        Ok(model.map(Into::into))
    }
}

#[async_trait]
impl<T: AccountTable> AccountRepository for AccountStore<T> {
    fn kind(&self) -> AccountKind {
        T::KIND
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        self.find_one(T::id_column(), id.into()).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        self.find_one(T::email_column(), email.into()).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        self.find_one(T::username_column(), username.into()).await
    }

    async fn create_and_invite(
        &self,
        account: NewAccount,
        invitation: NewInvitation,
    ) -> AppResult<Account> {
        let now = Utc::now();

        let created = with_transaction!(&self.db, self.query_timeout, |ctx| {
            let created = ctx.accounts::<T>().insert(account, now).await?;
            ctx.invitations()
                .insert(T::KIND, created.id, invitation, now)
                .await?;
            Ok(created)
        })?;

        tracing::debug!(kind = %T::KIND, account_id = %created.id, "Account created");
        Ok(created)
    }

    async fn activate(&self, token_digest: &str) -> AppResult<Account> {
        let now = Utc::now();
        let token_digest = token_digest.to_string();

        with_transaction!(&self.db, self.query_timeout, |ctx| {
            let invitation = ctx
                .invitations()
                .find_live_for_update(T::KIND, &token_digest, now)
                .await?
                .ok_or(AppError::NotFound)?;

            let account = ctx
                .accounts::<T>()
                .mark_verified(invitation.account_id, now)
                .await?;

            let consumed = ctx
                .invitations()
                .delete_for_account(T::KIND, invitation.account_id)
                .await?;
            if consumed == 0 {
                return Err(AppError::NotFound);
            }

            Ok(account)
        })
    }

    async fn reissue_invitation(
        &self,
        account_id: Uuid,
        invitation: NewInvitation,
    ) -> AppResult<()> {
        let now = Utc::now();

        with_transaction!(&self.db, self.query_timeout, |ctx| {
            let invitations = ctx.invitations();
            invitations.delete_for_account(T::KIND, account_id).await?;
            invitations
                .insert(T::KIND, account_id, invitation, now)
                .await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::repositories::entities::{invitation, user};
    use crate::infra::repositories::UserTable;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn new_account() -> NewAccount {
        NewAccount {
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            provider: "local".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role_id: 1,
            mentor_profile: None,
        }
    }

    fn new_invitation() -> NewInvitation {
        NewInvitation {
            token_digest: "d".repeat(64),
            expiry: Utc::now() + chrono::Duration::minutes(50),
        }
    }

    fn user_row(id: Uuid, is_verified: bool) -> user::Model {
        let now = Utc::now();
        user::Model {
            id,
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            provider: "local".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            is_active: true,
            is_verified,
            role_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn invitation_row(account_id: Uuid) -> invitation::Model {
        let now = Utc::now();
        invitation::Model {
            id: Uuid::new_v4(),
            account_kind: "user".to_string(),
            account_id,
            token_hash: "d".repeat(64),
            expiry: now + chrono::Duration::minutes(50),
            created_at: now,
        }
    }

    /// Every statement the connection saw, BEGIN/COMMIT/ROLLBACK included.
    fn transaction_log(db: DatabaseConnection) -> String {
        format!("{:?}", db.into_transaction_log())
    }

    #[tokio::test]
    async fn test_create_and_invite_commits() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user_row(id, false)]])
            .append_query_results(vec![vec![invitation_row(id)]])
            .into_connection();
        let store = AccountStore::<UserTable>::new(db.clone(), TIMEOUT);

        let created = store
            .create_and_invite(new_account(), new_invitation())
            .await
            .unwrap();
        assert_eq!(created.id, id);
        assert!(!created.is_verified);

        let log = transaction_log(db);
        assert!(log.contains("COMMIT"));
        assert!(!log.contains("ROLLBACK"));
    }

    #[tokio::test]
    async fn test_create_and_invite_rolls_back_on_invitation_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user_row(Uuid::new_v4(), false)]])
            .append_query_errors(vec![DbErr::Custom("invitations insert failed".into())])
            .into_connection();
        let store = AccountStore::<UserTable>::new(db.clone(), TIMEOUT);

        let err = store
            .create_and_invite(new_account(), new_invitation())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let log = transaction_log(db);
        assert!(log.contains("INSERT INTO \\\"users\\\""));
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_activate_unknown_or_expired_digest_is_not_found() {
        // The live filter excludes expired rows, so both come back empty
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<invitation::Model>::new()])
            .into_connection();
        let store = AccountStore::<UserTable>::new(db.clone(), TIMEOUT);

        let err = store.activate(&"d".repeat(64)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        let log = transaction_log(db);
        assert!(log.contains("FOR UPDATE"));
        assert!(log.contains("\\\"expiry\\\" >"));
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("UPDATE \\\"users\\\""));
    }

    #[tokio::test]
    async fn test_activate_marks_verified_and_consumes_invitation() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![invitation_row(id)]])
            .append_query_results(vec![vec![user_row(id, false)]])
            .append_query_results(vec![vec![user_row(id, true)]])
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let store = AccountStore::<UserTable>::new(db.clone(), TIMEOUT);

        let account = store.activate(&"d".repeat(64)).await.unwrap();
        assert_eq!(account.id, id);
        assert!(account.is_verified);

        let log = transaction_log(db);
        assert!(log.contains("DELETE FROM \\\"invitations\\\""));
        assert!(log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_activate_lost_race_is_not_found() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![invitation_row(id)]])
            .append_query_results(vec![vec![user_row(id, false)]])
            .append_query_results(vec![vec![user_row(id, true)]])
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let store = AccountStore::<UserTable>::new(db.clone(), TIMEOUT);

        let err = store.activate(&"d".repeat(64)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        let log = transaction_log(db);
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_find_by_email_maps_row() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user_row(id, true)]])
            .append_query_results(vec![Vec::<user::Model>::new()])
            .into_connection();
        let store = AccountStore::<UserTable>::new(db, TIMEOUT);

        let found = store.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.kind, AccountKind::User);

        assert!(store.find_by_email("ghost@example.com").await.unwrap().is_none());
    }
}
