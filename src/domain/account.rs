//! Account domain entity and related types.
//!
//! Users and mentors share one lifecycle. `AccountKind` carries the few
//! things that differ between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    ROLE_ID_MENTOR, ROLE_ID_USER, SESSION_KEY_MENTOR_EMAIL, SESSION_KEY_MENTOR_ID,
    SESSION_KEY_USERNAME, SESSION_KEY_USER_EMAIL, SESSION_KEY_USER_ID,
};
use crate::errors::AppError;

/// Kind of account, also the `:kind` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Mentor,
}

/// Session fields written at login for one account kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKeys {
    pub account_id: &'static str,
    pub username: &'static str,
    pub email: &'static str,
}

impl AccountKind {
    pub const ALL: [AccountKind; 2] = [AccountKind::User, AccountKind::Mentor];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::User => "user",
            AccountKind::Mentor => "mentor",
        }
    }

    pub fn session_keys(&self) -> SessionKeys {
        match self {
            AccountKind::User => SessionKeys {
                account_id: SESSION_KEY_USER_ID,
                username: SESSION_KEY_USERNAME,
                email: SESSION_KEY_USER_EMAIL,
            },
            AccountKind::Mentor => SessionKeys {
                account_id: SESSION_KEY_MENTOR_ID,
                username: SESSION_KEY_USERNAME,
                email: SESSION_KEY_MENTOR_EMAIL,
            },
        }
    }

    /// Role given to freshly registered accounts of this kind
    pub fn default_role_id(&self) -> i32 {
        match self {
            AccountKind::User => ROLE_ID_USER,
            AccountKind::Mentor => ROLE_ID_MENTOR,
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(AccountKind::User),
            "mentor" => Ok(AccountKind::Mentor),
            other => Err(AppError::BadRequest(format!("unknown account kind '{}'", other))),
        }
    }
}

/// Mentor-only profile data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MentorProfile {
    /// Experience in fractional years
    #[schema(example = 3.5)]
    pub experience_years: f32,
    pub bio: String,
}

impl MentorProfile {
    /// Build a profile from whole years plus remaining months.
    pub fn from_experience(years: u32, months: u32, bio: String) -> Self {
        Self {
            experience_years: years as f32 + months as f32 / 12.0,
            bio,
        }
    }
}

/// Account domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub kind: AccountKind,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub provider: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub role_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_profile: Option<MentorProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Login and protected routes require both flags.
    pub fn can_authenticate(&self) -> bool {
        self.is_active && self.is_verified
    }

    /// Registered but not yet activated.
    pub fn is_pending_activation(&self) -> bool {
        self.is_active && !self.is_verified
    }
}

/// Validated sign-up candidate with the plain password still attached.
#[derive(Clone)]
pub struct Registration {
    pub kind: AccountKind,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub provider: String,
    pub email: String,
    pub password: String,
    pub mentor_profile: Option<MentorProfile>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("kind", &self.kind)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub provider: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i32,
    pub mentor_profile: Option<MentorProfile>,
}

/// Account response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    pub kind: AccountKind,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "Liddell")]
    pub last_name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub is_verified: bool,
    pub role_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_profile: Option<MentorProfile>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            kind: account.kind,
            username: account.username,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            is_verified: account.is_verified,
            role_id: account.role_id,
            mentor_profile: account.mentor_profile,
            created_at: account.created_at,
        }
    }
}
