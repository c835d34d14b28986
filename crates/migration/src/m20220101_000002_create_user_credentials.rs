//! Create `user_credentials` table with FK to `user`.
//!
//! Holds the password hash, the email verification key (cleared once
//! verified) and the decaying brute-force counter. Kept apart from `user`
//! so credential material never rides along on ordinary user reads.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserCredentials::Table)
                    .if_not_exists()
                    .col(uuid(UserCredentials::UserId).primary_key())
                    .col(string_len(UserCredentials::PasswordHash, 255).not_null())
                    .col(string_len(UserCredentials::PasswordAlgorithm, 32).not_null())
                    .col(
                        ColumnDef::new(UserCredentials::EmailVerificationKey)
                            .string_len(128)
                            .null(),
                    )
                    .col(double(UserCredentials::BruteForceValue).not_null())
                    .col(timestamp_with_time_zone(UserCredentials::BruteForceUpdated).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_credentials_user")
                            .from(UserCredentials::Table, UserCredentials::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserCredentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserCredentials {
    Table,
    UserId,
    PasswordHash,
    PasswordAlgorithm,
    EmailVerificationKey,
    BruteForceValue,
    BruteForceUpdated,
}

#[derive(DeriveIden)]
enum User { Table, Id }
