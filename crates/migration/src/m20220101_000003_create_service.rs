//! Create `service` table: the category/offering forest.
//!
//! `parent_id` is a nullable self-reference; acyclicity is enforced at the
//! application layer before any write. `admins` is a uuid array, always
//! read and written whole.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Service::Table)
                    .if_not_exists()
                    .col(uuid(Service::Id).primary_key())
                    .col(string_len(Service::Slug, 64).unique_key().not_null())
                    .col(string_len(Service::Name, 128).not_null())
                    .col(ColumnDef::new(Service::Description).text().null())
                    .col(ColumnDef::new(Service::Terms).text().null())
                    .col(string_len(Service::Kind, 16).not_null())
                    .col(string_len(Service::Status, 16).not_null())
                    .col(ColumnDef::new(Service::ParentId).uuid().null())
                    .col(
                        ColumnDef::new(Service::Admins)
                            .array(ColumnType::Uuid)
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone(Service::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Service::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_parent")
                            .from(Service::Table, Service::ParentId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Service::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Service {
    Table,
    Id,
    Slug,
    Name,
    Description,
    Terms,
    Kind,
    Status,
    ParentId,
    Admins,
    CreatedAt,
    UpdatedAt,
}
