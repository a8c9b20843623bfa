//! Unit of Work: repository access and transaction lifecycle.
//!
//! Every multi-statement operation runs through [`transaction`], which
//! commits on `Ok`, rolls back on `Err`, and never returns with the
//! transaction still open. Each statement inside is bounded by the
//! configured query timeout.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::repositories::entities::invitation;
use super::repositories::{
    AccountRepository, AccountStore, AccountTable, MentorTable, RoleRepository, RoleStore,
    UserTable,
};
use crate::domain::{Account, AccountKind, NewAccount, NewInvitation};
use crate::errors::{AppError, AppResult};

/// Repository access for the service layer.
pub trait UnitOfWork: Send + Sync {
    /// Account repository for one account kind
    fn accounts(&self, kind: AccountKind) -> Arc<dyn AccountRepository>;

    /// Role reference data
    fn roles(&self) -> Arc<dyn RoleRepository>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    users: Arc<AccountStore<UserTable>>,
    mentors: Arc<AccountStore<MentorTable>>,
    roles: Arc<RoleStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection, query_timeout: Duration) -> Self {
        Self {
            users: Arc::new(AccountStore::new(db.clone(), query_timeout)),
            mentors: Arc::new(AccountStore::new(db.clone(), query_timeout)),
            roles: Arc::new(RoleStore::new(db, query_timeout)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn accounts(&self, kind: AccountKind) -> Arc<dyn AccountRepository> {
        match kind {
            AccountKind::User => self.users.clone(),
            AccountKind::Mentor => self.mentors.clone(),
        }
    }

    fn roles(&self) -> Arc<dyn RoleRepository> {
        self.roles.clone()
    }
}

/// Run one storage statement under `limit`.
pub async fn bounded<T, E, F>(limit: Duration, statement: F) -> AppResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<AppError>,
{
    match tokio::time::timeout(limit, statement).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Statement timed out");
            Err(AppError::StorageTimeout)
        }
    }
}

/// Execute a closure within a READ COMMITTED, read-write transaction.
pub async fn transaction<F, T>(db: &DatabaseConnection, query_timeout: Duration, f: F) -> AppResult<T>
where
    F: for<'a> FnOnce(
            TransactionContext<'a>,
        ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>
        + Send,
    T: Send,
{
    let txn = bounded(
        query_timeout,
        db.begin_with_config(Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite)),
    )
    .await?;

    let ctx = TransactionContext::new(&txn, query_timeout);

    match f(ctx).await {
        Ok(result) => {
            bounded(query_timeout, txn.commit()).await?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Repository access bound to one open transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
    query_timeout: Duration,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction, query_timeout: Duration) -> Self {
        Self { txn, query_timeout }
    }

    /// Account rows of table `T` inside this transaction
    pub fn accounts<T: AccountTable>(&self) -> TxAccountRepository<'_, T> {
        TxAccountRepository {
            txn: self.txn,
            query_timeout: self.query_timeout,
            _table: PhantomData,
        }
    }

    /// Invitation rows inside this transaction
    pub fn invitations(&self) -> TxInvitationRepository<'_> {
        TxInvitationRepository {
            txn: self.txn,
            query_timeout: self.query_timeout,
        }
    }
}

/// Transaction-scoped account writes.
pub struct TxAccountRepository<'a, T: AccountTable> {
    txn: &'a DatabaseTransaction,
    query_timeout: Duration,
    _table: PhantomData<T>,
}

impl<'a, T: AccountTable> TxAccountRepository<'a, T> {
    /// Insert a new, unverified account row.
    ///
    /// Unique violations come back as `DuplicateEmail` / `DuplicateUsername`.
    pub async fn insert(&self, account: NewAccount, now: DateTime<Utc>) -> AppResult<Account> {
        let row = T::new_row(Uuid::new_v4(), account, now);
        let model = bounded(self.query_timeout, async {
            row.insert(self.txn).await.map_err(AppError::from_account_write)
        })
        .await?;

        Ok(model.into())
    }

    /// Set `is_verified` on an existing row.
    pub async fn mark_verified(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Account> {
        let model = bounded(
            self.query_timeout,
            T::Entity::find()
                .filter(T::id_column().eq(id))
                .lock_exclusive()
                .one(self.txn),
        )
        .await?
        .ok_or(AppError::NotFound)?;

        let updated = bounded(self.query_timeout, T::verified(model, now).update(self.txn)).await?;
        Ok(updated.into())
    }
}

/// Transaction-scoped invitation access.
pub struct TxInvitationRepository<'a> {
    txn: &'a DatabaseTransaction,
    query_timeout: Duration,
}

impl<'a> TxInvitationRepository<'a> {
    /// Store an invitation digest for `account_id`.
    pub async fn insert(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        invitation: NewInvitation,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let row = invitation::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_kind: Set(kind.as_str().to_string()),
            account_id: Set(account_id),
            token_hash: Set(invitation.token_digest),
            expiry: Set(invitation.expiry),
            created_at: Set(now),
        };

        bounded(self.query_timeout, row.insert(self.txn)).await?;
        Ok(())
    }

    /// Live invitation for a digest, locked until the transaction ends.
    ///
    /// Expired rows are treated as absent.
    pub async fn find_live_for_update(
        &self,
        kind: AccountKind,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<invitation::Model>> {
        bounded(
            self.query_timeout,
            invitation::Entity::find()
                .filter(invitation::Column::AccountKind.eq(kind.as_str()))
                .filter(invitation::Column::TokenHash.eq(token_digest))
                .filter(invitation::Column::Expiry.gt(now))
                .lock_exclusive()
                .one(self.txn),
        )
        .await
    }

    /// Remove every invitation owned by an account. Returns rows removed.
    pub async fn delete_for_account(&self, kind: AccountKind, account_id: Uuid) -> AppResult<u64> {
        let result = bounded(
            self.query_timeout,
            invitation::Entity::delete_many()
                .filter(invitation::Column::AccountKind.eq(kind.as_str()))
                .filter(invitation::Column::AccountId.eq(account_id))
                .exec(self.txn),
        )
        .await?;

        Ok(result.rows_affected)
    }
}

/// Run a transactional block against a connection.
///
/// ```rust,ignore
/// let account = with_transaction!(&db, timeout, |ctx| {
///     let account = ctx.accounts::<UserTable>().insert(new_account, now).await?;
///     ctx.invitations().insert(AccountKind::User, account.id, invitation, now).await?;
///     Ok(account)
/// })?;
/// ```
#[macro_export]
macro_rules! with_transaction {
    ($db:expr, $timeout:expr, |$ctx:ident| $body:expr) => {
        $crate::infra::unit_of_work::transaction($db, $timeout, |$ctx| {
            Box::pin(async move { $body })
        })
        .await
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, DbErr>(())
        };

        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, AppError::StorageTimeout));
    }

    #[tokio::test]
    async fn test_bounded_passes_through_result() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, DbErr>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let err = bounded(Duration::from_secs(1), async {
            Err::<(), _>(DbErr::Custom("boom".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result: AppResult<()> = transaction(&db, Duration::from_secs(1), |_ctx| {
            Box::pin(async move { Err(AppError::NotFound) })
        })
        .await;
        assert!(matches!(result, Err(AppError::NotFound)));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("BEGIN"));
        assert!(log.contains("ROLLBACK"));
        assert!(!log.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_delete_for_account_reports_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();

        let removed = transaction(&db, Duration::from_secs(1), |ctx| {
            Box::pin(async move {
                ctx.invitations()
                    .delete_for_account(AccountKind::Mentor, Uuid::new_v4())
                    .await
            })
        })
        .await
        .unwrap();
        assert_eq!(removed, 2);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("DELETE FROM \\\"invitations\\\""));
        assert!(log.contains("COMMIT"));
    }
}
