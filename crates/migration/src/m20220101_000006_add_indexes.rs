use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Service: children are looked up by parent on every show()
        manager
            .create_index(
                Index::create()
                    .name("idx_service_parent")
                    .table(Service::Table)
                    .col(Service::ParentId)
                    .to_owned(),
            )
            .await?;

        // Offer: per-service and per-provider listings, filtered by status
        manager
            .create_index(
                Index::create()
                    .name("idx_offer_service_status")
                    .table(Offer::Table)
                    .col(Offer::ServiceId)
                    .col(Offer::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_offer_provider_status")
                    .table(Offer::Table)
                    .col(Offer::ProviderId)
                    .col(Offer::Status)
                    .to_owned(),
            )
            .await?;

        // UserCredentials: email verification lands by key
        manager
            .create_index(
                Index::create()
                    .name("idx_credentials_verification_key")
                    .table(UserCredentials::Table)
                    .col(UserCredentials::EmailVerificationKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_service_parent").table(Service::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_offer_service_status").table(Offer::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_offer_provider_status").table(Offer::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_credentials_verification_key")
                    .table(UserCredentials::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Service { Table, ParentId }

#[derive(DeriveIden)]
enum Offer { Table, ServiceId, ProviderId, Status }

#[derive(DeriveIden)]
enum UserCredentials { Table, EmailVerificationKey }
