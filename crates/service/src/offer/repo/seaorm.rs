use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::offer::repository::OfferRepository;

pub struct SeaOrmOfferRepository {
    pub db: DatabaseConnection,
}

fn active(model: models::offer::Model) -> models::offer::ActiveModel {
    models::offer::ActiveModel {
        id: Set(model.id),
        service_id: Set(model.service_id),
        provider_id: Set(model.provider_id),
        status: Set(model.status),
        description: Set(model.description),
        landing: Set(model.landing),
        location: Set(model.location),
        price_currency: Set(model.price_currency),
        price_amount: Set(model.price_amount),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
}

#[async_trait::async_trait]
impl OfferRepository for SeaOrmOfferRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<models::offer::Model>, ServiceError> {
        models::offer::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn insert(
        &self,
        model: models::offer::Model,
    ) -> Result<models::offer::Model, ServiceError> {
        active(model)
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn update(
        &self,
        model: models::offer::Model,
    ) -> Result<models::offer::Model, ServiceError> {
        active(model)
            .update(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        models::offer::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(())
    }
}
