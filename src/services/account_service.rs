//! Account lifecycle service - registration, activation, login.
//!
//! The same flow serves every account kind. Storage differences live
//! behind `UnitOfWork::accounts(kind)`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use uuid::Uuid;

use crate::config::{activation_url, Config};
use crate::domain::token::digest;
use crate::domain::{
    Account, AccountKind, HashCost, IssuedToken, NewAccount, NewInvitation, Password,
    Registration, Role,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{EmailTemplate, Mailer, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Compared against when no account matches a login, so a miss costs
/// the same as a wrong password.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

/// A registered (or re-invited) account and the raw token to mail it.
#[derive(Debug, Clone)]
pub struct Invited {
    pub account: Account,
    pub token: IssuedToken,
}

/// Knobs the lifecycle needs from configuration.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub hash_cost: HashCost,
    pub invitation_ttl: chrono::Duration,
    pub frontend_url: String,
}

impl LifecycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hash_cost: config.hash_cost,
            invitation_ttl: chrono::Duration::minutes(config.invitation_ttl_minutes),
            frontend_url: config.frontend_url.clone(),
        }
    }
}

/// Account lifecycle operations.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an unverified account with a live invitation.
    ///
    /// A repeat of an earlier, still-unverified signup with the same
    /// username, email and password re-issues the invitation instead of
    /// failing as a duplicate.
    async fn register(&self, registration: Registration) -> AppResult<Invited>;

    /// Mail the activation link. Fails with `InvitationNotSent`.
    async fn send_invitation(&self, invited: &Invited) -> AppResult<()>;

    /// Consume a raw token. Any failure is `ActivationFailed`.
    async fn activate(&self, kind: AccountKind, raw_token: String) -> AppResult<Account>;

    /// Check credentials. Every failure is `IncorrectCredentials`.
    async fn authenticate(
        &self,
        kind: AccountKind,
        email: String,
        password: String,
    ) -> AppResult<Account>;

    /// Fresh invitation for a pending account, `None` otherwise.
    async fn reinvite(&self, kind: AccountKind, email: String) -> AppResult<Option<Invited>>;

    async fn find_account(&self, kind: AccountKind, id: Uuid) -> AppResult<Option<Account>>;

    async fn find_role(&self, role_id: i32) -> AppResult<Option<Role>>;
}

/// Concrete implementation of AccountService using Unit of Work.
pub struct AccountLifecycle<U: UnitOfWork> {
    uow: Arc<U>,
    mailer: Arc<dyn Mailer>,
    settings: LifecycleSettings,
    dummy: OnceCell<Password>,
}

impl<U: UnitOfWork> AccountLifecycle<U> {
    pub fn new(uow: Arc<U>, mailer: Arc<dyn Mailer>, settings: LifecycleSettings) -> Self {
        Self {
            uow,
            mailer,
            settings,
            dummy: OnceCell::new(),
        }
    }

    fn dummy_password(&self) -> AppResult<&Password> {
        self.dummy
            .get_or_try_init(|| Password::with_cost(DUMMY_PASSWORD, &self.settings.hash_cost))
    }

    fn new_invitation(&self) -> (IssuedToken, NewInvitation) {
        let token = IssuedToken::issue();
        let invitation = NewInvitation::for_token(&token, self.settings.invitation_ttl, Utc::now());
        (token, invitation)
    }

    async fn reissue(&self, account: Account) -> AppResult<Invited> {
        let (token, invitation) = self.new_invitation();
        self.uow
            .accounts(account.kind)
            .reissue_invitation(account.id, invitation)
            .await?;

        tracing::info!(kind = %account.kind, account_id = %account.id, "Invitation re-issued");
        Ok(Invited { account, token })
    }
}

/// Same person retrying a signup whose mail never arrived.
fn is_retry(existing: &Account, registration: &Registration) -> bool {
    existing.is_pending_activation()
        && existing.username == registration.username
        && Password::from_hash(existing.password_hash.clone()).verify(&registration.password)
}

#[async_trait]
impl<U: UnitOfWork> AccountService for AccountLifecycle<U> {
    async fn register(&self, registration: Registration) -> AppResult<Invited> {
        let kind = registration.kind;
        let repo = self.uow.accounts(kind);

        let mentor_profile = match kind {
            AccountKind::Mentor => Some(registration.mentor_profile.clone().ok_or_else(|| {
                AppError::validation("Mentors must provide their experience")
            })?),
            AccountKind::User => None,
        };

        let by_username = repo.find_by_username(&registration.username).await?;
        let by_email = repo.find_by_email(&registration.email).await?;

        if let Some(existing) = by_email.as_ref() {
            if is_retry(existing, &registration) {
                return self.reissue(existing.clone()).await;
            }
        }
        if by_username.is_some() {
            return Err(AppError::DuplicateUsername);
        }
        if by_email.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password = Password::with_cost(&registration.password, &self.settings.hash_cost)?;
        let (token, invitation) = self.new_invitation();

        let account = repo
            .create_and_invite(
                NewAccount {
                    username: registration.username,
                    first_name: registration.first_name,
                    last_name: registration.last_name,
                    provider: registration.provider,
                    email: registration.email,
                    password_hash: password.into_string(),
                    role_id: kind.default_role_id(),
                    mentor_profile,
                },
                invitation,
            )
            .await?;

        tracing::info!(kind = %kind, account_id = %account.id, "Account registered");
        Ok(Invited { account, token })
    }

    async fn send_invitation(&self, invited: &Invited) -> AppResult<()> {
        let account = &invited.account;
        let mut data = BTreeMap::new();
        data.insert("username".to_string(), account.username.clone());
        data.insert(
            "activation_url".to_string(),
            activation_url(&self.settings.frontend_url, account.kind, &invited.token.raw),
        );

        self.mailer
            .send(
                EmailTemplate::UserInvitation,
                account.username.clone(),
                vec![account.email.clone()],
                data,
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    kind = %account.kind,
                    account_id = %account.id,
                    error = %e,
                    "Activation email not sent"
                );
                match e {
                    AppError::InvitationNotSent(reason) => AppError::InvitationNotSent(reason),
                    other => AppError::InvitationNotSent(other.to_string()),
                }
            })
    }

    async fn activate(&self, kind: AccountKind, raw_token: String) -> AppResult<Account> {
        let result = self.uow.accounts(kind).activate(&digest(&raw_token)).await;

        match result {
            Ok(account) => {
                tracing::info!(kind = %kind, account_id = %account.id, "Account activated");
                Ok(account)
            }
            Err(AppError::NotFound) => Err(AppError::ActivationFailed),
            Err(e) => Err(e),
        }
    }

    async fn authenticate(
        &self,
        kind: AccountKind,
        email: String,
        password: String,
    ) -> AppResult<Account> {
        let found = self.uow.accounts(kind).find_by_email(&email).await?;

        let matches = match &found {
            Some(account) => Password::from_hash(account.password_hash.clone()).verify(&password),
            None => {
                self.dummy_password()?.verify(&password);
                false
            }
        };

        match found {
            Some(account) if matches && account.can_authenticate() => Ok(account),
            Some(account) => {
                tracing::debug!(
                    kind = %kind,
                    account_id = %account.id,
                    password_ok = matches,
                    active = account.is_active,
                    verified = account.is_verified,
                    "Login rejected"
                );
                Err(AppError::IncorrectCredentials)
            }
            None => Err(AppError::IncorrectCredentials),
        }
    }

    async fn reinvite(&self, kind: AccountKind, email: String) -> AppResult<Option<Invited>> {
        match self.uow.accounts(kind).find_by_email(&email).await? {
            Some(account) if account.is_pending_activation() => {
                self.reissue(account).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn find_account(&self, kind: AccountKind, id: Uuid) -> AppResult<Option<Account>> {
        self.uow.accounts(kind).find_by_id(id).await
    }

    async fn find_role(&self, role_id: i32) -> AppResult<Option<Role>> {
        self.uow.roles().find_by_id(role_id).await
    }
}
