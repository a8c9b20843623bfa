//! In-memory stand-ins for storage, sessions and mail.
//!
//! They follow the same contracts as the Postgres/Redis/Resend backends so
//! the full lifecycle can run without any external service.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use inquiro_api::config::SessionConfig;
use inquiro_api::domain::{Account, AccountKind, HashCost, NewAccount, NewInvitation, Role};
use inquiro_api::errors::{AppError, AppResult};
use inquiro_api::infra::{
    AccountRepository, EmailTemplate, Mailer, RoleRepository, SessionStore, UnitOfWork,
};
use inquiro_api::services::{AccountLifecycle, LifecycleSettings, Services};
use inquiro_api::AppState;

pub fn cheap_cost() -> HashCost {
    HashCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn settings(invitation_ttl: chrono::Duration) -> LifecycleSettings {
    LifecycleSettings {
        hash_cost: cheap_cost(),
        invitation_ttl,
        frontend_url: "http://localhost:3000".to_string(),
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Default)]
struct AccountRows {
    accounts: Vec<Account>,
    invitations: Vec<(Uuid, NewInvitation)>,
}

/// One account table and its invitations.
pub struct MemoryAccounts {
    kind: AccountKind,
    rows: Mutex<AccountRows>,
}

impl MemoryAccounts {
    pub fn new(kind: AccountKind) -> Self {
        Self {
            kind,
            rows: Mutex::new(AccountRows::default()),
        }
    }

    pub fn stored(&self, email: &str) -> Option<Account> {
        let rows = self.rows.lock().unwrap();
        rows.accounts.iter().find(|a| a.email == email).cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().accounts.len()
    }

    pub fn invitations_for(&self, account_id: Uuid) -> Vec<NewInvitation> {
        let rows = self.rows.lock().unwrap();
        rows.invitations
            .iter()
            .filter(|(id, _)| *id == account_id)
            .map(|(_, invitation)| invitation.clone())
            .collect()
    }

    pub fn deactivate(&self, account_id: Uuid) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(account) = rows.accounts.iter_mut().find(|a| a.id == account_id) {
            account.is_active = false;
        }
    }

    fn find(&self, matches: impl Fn(&Account) -> bool) -> Option<Account> {
        let rows = self.rows.lock().unwrap();
        rows.accounts.iter().find(|a| matches(a)).cloned()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    fn kind(&self) -> AccountKind {
        self.kind
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.find(|a| a.id == id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        Ok(self.find(|a| a.email == email))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        Ok(self.find(|a| a.username == username))
    }

    async fn create_and_invite(
        &self,
        account: NewAccount,
        invitation: NewInvitation,
    ) -> AppResult<Account> {
        let mut rows = self.rows.lock().unwrap();
        if rows.accounts.iter().any(|a| a.username == account.username) {
            return Err(AppError::DuplicateUsername);
        }
        if rows.accounts.iter().any(|a| a.email == account.email) {
            return Err(AppError::DuplicateEmail);
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            kind: self.kind,
            username: account.username,
            first_name: account.first_name,
            last_name: account.last_name,
            provider: account.provider,
            email: account.email,
            password_hash: account.password_hash,
            is_active: true,
            is_verified: false,
            role_id: account.role_id,
            mentor_profile: account.mentor_profile,
            created_at: now,
            updated_at: now,
        };

        rows.invitations.push((created.id, invitation));
        rows.accounts.push(created.clone());
        Ok(created)
    }

    async fn activate(&self, token_digest: &str) -> AppResult<Account> {
        let now = Utc::now();
        let mut rows = self.rows.lock().unwrap();

        let account_id = rows
            .invitations
            .iter()
            .find(|(_, inv)| inv.token_digest == token_digest && inv.expiry > now)
            .map(|(id, _)| *id)
            .ok_or(AppError::NotFound)?;

        rows.invitations.retain(|(id, _)| *id != account_id);

        let account = rows
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(AppError::NotFound)?;
        account.is_verified = true;
        account.updated_at = now;

        Ok(account.clone())
    }

    async fn reissue_invitation(
        &self,
        account_id: Uuid,
        invitation: NewInvitation,
    ) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.invitations.retain(|(id, _)| *id != account_id);
        rows.invitations.push((account_id, invitation));
        Ok(())
    }
}

// =============================================================================
// Roles
// =============================================================================

pub struct MemoryRoles {
    roles: Mutex<Vec<Role>>,
}

impl MemoryRoles {
    /// The three seeded roles
    pub fn seeded() -> Self {
        let role = |id: i32, name: &str| Role {
            id,
            name: name.to_string(),
            level: id,
            description: format!("{} role", name),
        };
        Self {
            roles: Mutex::new(vec![role(1, "user"), role(2, "mentor"), role(3, "admin")]),
        }
    }

    pub fn remove(&self, id: i32) {
        self.roles.lock().unwrap().retain(|r| r.id != id);
    }
}

#[async_trait]
impl RoleRepository for MemoryRoles {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>> {
        let roles = self.roles.lock().unwrap();
        Ok(roles.iter().find(|r| r.id == id).cloned())
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

pub struct MemoryUow {
    pub users: Arc<MemoryAccounts>,
    pub mentors: Arc<MemoryAccounts>,
    pub roles: Arc<MemoryRoles>,
}

impl UnitOfWork for MemoryUow {
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

// =============================================================================
// Sessions
// =============================================================================

#[derive(Default)]
pub struct MemorySessions {
    sessions: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemorySessions {
    pub fn field(&self, session_id: &str, key: &str) -> Option<String> {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(session_id).and_then(|s| s.get(key).cloned())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(session_id)
    }

    /// Plant a session as if an earlier request had written it.
    pub fn seed(&self, session_id: &str, fields: &[(&str, &str)]) {
        let map = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), map);
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn put(&self, session_id: &str, fields: Vec<(String, String)>) -> AppResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(session_id.to_string())
            .or_default()
            .extend(fields);
        Ok(())
    }

    async fn contains(&self, session_id: &str) -> AppResult<bool> {
        Ok(MemorySessions::contains(self, session_id))
    }

    async fn get_string(&self, session_id: &str, key: &str) -> AppResult<Option<String>> {
        Ok(self.field(session_id, key))
    }

    async fn exists(&self, session_id: &str, key: &str) -> AppResult<bool> {
        Ok(self.field(session_id, key).is_some())
    }

    async fn clear(&self, session_id: &str) -> AppResult<()> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}

// =============================================================================
// Mail
// =============================================================================

#[derive(Debug, Clone)]
pub struct SentMail {
    pub template: EmailTemplate,
    pub to: Vec<String>,
    pub data: BTreeMap<String, String>,
}

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Raw token from the most recent activation link.
    pub fn last_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let url = sent.last()?.data.get("activation_url")?.clone();
        url.rsplit('/').next().map(str::to_string)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        template: EmailTemplate,
        _recipient_name: String,
        to: Vec<String>,
        data: BTreeMap<String, String>,
    ) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::InvitationNotSent("mail provider unavailable".into()));
        }
        self.sent.lock().unwrap().push(SentMail { template, to, data });
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// The lifecycle service wired to in-memory backends.
pub struct Harness {
    pub users: Arc<MemoryAccounts>,
    pub mentors: Arc<MemoryAccounts>,
    pub roles: Arc<MemoryRoles>,
    pub sessions: Arc<MemorySessions>,
    pub mailer: Arc<RecordingMailer>,
    pub service: Arc<AccountLifecycle<MemoryUow>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_invitation_ttl(chrono::Duration::minutes(50))
    }

    pub fn with_invitation_ttl(ttl: chrono::Duration) -> Self {
        let users = Arc::new(MemoryAccounts::new(AccountKind::User));
        let mentors = Arc::new(MemoryAccounts::new(AccountKind::Mentor));
        let roles = Arc::new(MemoryRoles::seeded());
        let mailer = Arc::new(RecordingMailer::default());

        let uow = Arc::new(MemoryUow {
            users: users.clone(),
            mentors: mentors.clone(),
            roles: roles.clone(),
        });
        let service = Arc::new(AccountLifecycle::new(uow, mailer.clone(), settings(ttl)));

        Self {
            users,
            mentors,
            roles,
            sessions: Arc::new(MemorySessions::default()),
            mailer,
            service,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            Arc::new(Services::new(self.service.clone())),
            self.sessions.clone(),
            SessionConfig::default(),
        )
    }
}
