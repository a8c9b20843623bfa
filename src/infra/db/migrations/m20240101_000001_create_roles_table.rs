//! Migration: Create the roles table and seed the built-in roles.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const SEED: [(i32, &str, i32, &str); 3] = [
    (1, "user", 1, "Registered learner"),
    (2, "mentor", 2, "Registered mentor"),
    (3, "admin", 3, "Platform administrator"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Roles::Name).string_len(50).not_null().unique_key())
                    .col(ColumnDef::new(Roles::Level).integer().not_null())
                    .col(ColumnDef::new(Roles::Description).text().not_null())
                    .to_owned(),
            )
            .await?;

        let mut insert = Query::insert();
        insert
            .into_table(Roles::Table)
            .columns([Roles::Id, Roles::Name, Roles::Level, Roles::Description]);
        for (id, name, level, description) in SEED {
            insert
                .values([id.into(), name.into(), level.into(), description.into()])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Roles {
    Table,
    Id,
    Name,
    Level,
    Description,
}
