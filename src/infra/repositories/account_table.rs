//! Storage capability set shared by the account tables.
//!
//! `users` and `mentors` have the same lifecycle columns; `AccountTable`
//! names the pieces that differ so one generic repository serves both.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityTrait, FromQueryResult, IntoActiveModel, Set,
};
use uuid::Uuid;

use super::entities::{mentor, user};
use crate::domain::{Account, AccountKind, NewAccount};

/// Entity-level description of one account table.
pub trait AccountTable: Send + Sync + 'static {
    const KIND: AccountKind;

    type Entity: EntityTrait<Model = Self::Model, ActiveModel = Self::ActiveModel>;
    type Model: FromQueryResult + IntoActiveModel<Self::ActiveModel> + Into<Account> + Send + Sync;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;

    fn id_column() -> <Self::Entity as EntityTrait>::Column;
    fn email_column() -> <Self::Entity as EntityTrait>::Column;
    fn username_column() -> <Self::Entity as EntityTrait>::Column;

    /// Active model for a fresh, unverified row.
    fn new_row(id: Uuid, account: NewAccount, now: DateTime<Utc>) -> Self::ActiveModel;

    /// Active model flipping `is_verified` on an existing row.
    fn verified(model: Self::Model, now: DateTime<Utc>) -> Self::ActiveModel;
}

/// The `users` table
pub struct UserTable;

impl AccountTable for UserTable {
    const KIND: AccountKind = AccountKind::User;

    type Entity = user::Entity;
    type Model = user::Model;
    type ActiveModel = user::ActiveModel;

    fn id_column() -> user::Column {
        user::Column::Id
    }

    fn email_column() -> user::Column {
        user::Column::Email
    }

    fn username_column() -> user::Column {
        user::Column::Username
    }

    fn new_row(id: Uuid, account: NewAccount, now: DateTime<Utc>) -> user::ActiveModel {
        user::ActiveModel {
            id: Set(id),
            username: Set(account.username),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            provider: Set(account.provider),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            is_active: Set(true),
            is_verified: Set(false),
            role_id: Set(account.role_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn verified(model: user::Model, now: DateTime<Utc>) -> user::ActiveModel {
        let mut active: user::ActiveModel = model.into();
        active.is_verified = Set(true);
        active.updated_at = Set(now);
        active
    }
}

/// The `mentors` table
pub struct MentorTable;

impl AccountTable for MentorTable {
    const KIND: AccountKind = AccountKind::Mentor;

    type Entity = mentor::Entity;
    type Model = mentor::Model;
    type ActiveModel = mentor::ActiveModel;

    fn id_column() -> mentor::Column {
        mentor::Column::Id
    }

    fn email_column() -> mentor::Column {
        mentor::Column::Email
    }

    fn username_column() -> mentor::Column {
        mentor::Column::Username
    }

    fn new_row(id: Uuid, account: NewAccount, now: DateTime<Utc>) -> mentor::ActiveModel {
        let (experience_years, bio) = account
            .mentor_profile
            .map(|p| (p.experience_years, p.bio))
            .unwrap_or_default();

        mentor::ActiveModel {
            id: Set(id),
            username: Set(account.username),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            provider: Set(account.provider),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            is_active: Set(true),
            is_verified: Set(false),
            experience_years: Set(experience_years),
            bio: Set(bio),
            role_id: Set(account.role_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn verified(model: mentor::Model, now: DateTime<Utc>) -> mentor::ActiveModel {
        let mut active: mentor::ActiveModel = model.into();
        active.is_verified = Set(true);
        active.updated_at = Set(now);
        active
    }
}
