//! Create `user` table.
//!
//! Usernames are matched case-insensitively through the derived
//! `lowercase_username` column.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Username, 20).unique_key().not_null())
                    .col(string_len(User::LowercaseUsername, 20).unique_key().not_null())
                    .col(string_len(User::Email, 255).unique_key().not_null())
                    .col(ColumnDef::new(User::Name).string_len(128).null())
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User { Table, Id, Username, LowercaseUsername, Email, Name, CreatedAt, UpdatedAt }
