//! Mentor database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Account, AccountKind, MentorProfile};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mentors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub provider: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub experience_years: f32,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub role_id: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id"
    )]
    Role,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Account {
            id: model.id,
            kind: AccountKind::Mentor,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            provider: model.provider,
            email: model.email,
            password_hash: model.password_hash,
            is_active: model.is_active,
            is_verified: model.is_verified,
            role_id: model.role_id,
            mentor_profile: Some(MentorProfile {
                experience_years: model.experience_years,
                bio: model.bio,
            }),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
