//! Create `provider` table. Providers are flat: no hierarchy, admin set only.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Provider::Table)
                    .if_not_exists()
                    .col(uuid(Provider::Id).primary_key())
                    .col(string_len(Provider::Slug, 64).unique_key().not_null())
                    .col(string_len(Provider::Name, 128).not_null())
                    .col(ColumnDef::new(Provider::Description).text().null())
                    .col(string_len(Provider::Ownership, 16).not_null())
                    .col(
                        ColumnDef::new(Provider::Admins)
                            .array(ColumnType::Uuid)
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone(Provider::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Provider::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Provider::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Provider { Table, Id, Slug, Name, Description, Ownership, Admins, CreatedAt, UpdatedAt }
