//! Create `offer` table with FKs to `service` and `provider`.
//!
//! Service deletion is blocked while offers exist; provider deletion
//! removes its offers first inside a transaction, so both FKs restrict.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Offer::Table)
                    .if_not_exists()
                    .col(uuid(Offer::Id).primary_key())
                    .col(uuid(Offer::ServiceId).not_null())
                    .col(uuid(Offer::ProviderId).not_null())
                    .col(string_len(Offer::Status, 16).not_null())
                    .col(ColumnDef::new(Offer::Description).text().null())
                    .col(string_len(Offer::Landing, 512).not_null())
                    .col(string_len(Offer::Location, 255).not_null())
                    .col(string_len(Offer::PriceCurrency, 3).not_null())
                    .col(double(Offer::PriceAmount).not_null())
                    .col(timestamp_with_time_zone(Offer::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Offer::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offer_service")
                            .from(Offer::Table, Offer::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offer_provider")
                            .from(Offer::Table, Offer::ProviderId)
                            .to(Provider::Table, Provider::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Offer::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Offer {
    Table,
    Id,
    ServiceId,
    ProviderId,
    Status,
    Description,
    Landing,
    Location,
    PriceCurrency,
    PriceAmount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Service { Table, Id }

#[derive(DeriveIden)]
enum Provider { Table, Id }
