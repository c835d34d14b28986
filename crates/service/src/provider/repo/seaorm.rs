use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use models::offer::OfferStatus;

use crate::errors::ServiceError;
use crate::provider::repository::{OfferWithService, ProviderRepository};

pub struct SeaOrmProviderRepository {
    pub db: DatabaseConnection,
}

fn active(model: models::provider::Model) -> models::provider::ActiveModel {
    models::provider::ActiveModel {
        id: Set(model.id),
        slug: Set(model.slug),
        name: Set(model.name),
        description: Set(model.description),
        ownership: Set(model.ownership),
        admins: Set(model.admins),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
}

#[async_trait::async_trait]
impl ProviderRepository for SeaOrmProviderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<models::provider::Model>, ServiceError> {
        models::provider::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<models::provider::Model>, ServiceError> {
        models::provider::Entity::find()
            .filter(models::provider::Column::Slug.eq(slug.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_all(&self) -> Result<Vec<models::provider::Model>, ServiceError> {
        models::provider::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_offers(
        &self,
        provider_id: Uuid,
        public_only: bool,
    ) -> Result<Vec<OfferWithService>, ServiceError> {
        let mut query = models::offer::Entity::find()
            .filter(models::offer::Column::ProviderId.eq(provider_id));
        if public_only {
            query = query.filter(models::offer::Column::Status.eq(OfferStatus::Public));
        }
        let rows = query
            .find_also_related(models::service::Entity)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        rows.into_iter()
            .map(|(offer, service)| {
                let service = service.ok_or_else(|| {
                    ServiceError::Db(format!("offer {} has no service row", offer.id))
                })?;
                Ok(OfferWithService { offer, service })
            })
            .collect()
    }

    async fn insert(
        &self,
        model: models::provider::Model,
    ) -> Result<models::provider::Model, ServiceError> {
        active(model)
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn update(
        &self,
        model: models::provider::Model,
    ) -> Result<models::provider::Model, ServiceError> {
        active(model)
            .update(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn delete_with_offers(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        models::offer::Entity::delete_many()
            .filter(models::offer::Column::ProviderId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        models::provider::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        txn.commit().await.map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(())
    }
}
