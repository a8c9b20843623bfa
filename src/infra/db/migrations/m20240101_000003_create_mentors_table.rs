//! Migration: Create the mentors table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_roles_table::Roles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mentors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Mentors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Mentors::Username).string_len(50).not_null().unique_key())
                    .col(ColumnDef::new(Mentors::FirstName).string_len(100).not_null())
                    .col(ColumnDef::new(Mentors::LastName).string_len(100).not_null())
                    .col(ColumnDef::new(Mentors::Provider).string_len(20).not_null())
                    .col(ColumnDef::new(Mentors::Email).string_len(254).not_null().unique_key())
                    .col(ColumnDef::new(Mentors::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Mentors::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Mentors::IsVerified).boolean().not_null().default(false))
                    .col(ColumnDef::new(Mentors::ExperienceYears).float().not_null().default(0.0))
                    .col(ColumnDef::new(Mentors::Bio).text().not_null().default(""))
                    .col(ColumnDef::new(Mentors::RoleId).integer().not_null())
                    .col(
                        ColumnDef::new(Mentors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Mentors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mentors_role_id")
                            .from(Mentors::Table, Mentors::RoleId)
                            .to(Roles::Table, Roles::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Mentors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Mentors {
    Table,
    Id,
    Username,
    FirstName,
    LastName,
    Provider,
    Email,
    PasswordHash,
    IsActive,
    IsVerified,
    ExperienceYears,
    Bio,
    RoleId,
    CreatedAt,
    UpdatedAt,
}
