//! Migration: Create the invitations table.
//!
//! Rows reference either `users` or `mentors` depending on `account_kind`,
//! so there is no foreign key on `account_id`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invitations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invitations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Invitations::AccountKind).string_len(20).not_null())
                    .col(ColumnDef::new(Invitations::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Invitations::TokenHash).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Invitations::Expiry).timestamp_with_time_zone().not_null())
                    .col(
                        ColumnDef::new(Invitations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invitations_account")
                    .table(Invitations::Table)
                    .col(Invitations::AccountKind)
                    .col(Invitations::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invitations_expiry")
                    .table(Invitations::Table)
                    .col(Invitations::Expiry)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invitations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Invitations {
    Table,
    Id,
    AccountKind,
    AccountId,
    TokenHash,
    Expiry,
    CreatedAt,
}
