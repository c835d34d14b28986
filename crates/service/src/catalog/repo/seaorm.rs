use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use models::offer::OfferStatus;
use models::service::PublishStatus;

use crate::catalog::repository::{CatalogRepository, OfferWithProvider};
use crate::errors::ServiceError;

pub struct SeaOrmCatalogRepository {
    pub db: DatabaseConnection,
}

fn active(model: models::service::Model) -> models::service::ActiveModel {
    models::service::ActiveModel {
        id: Set(model.id),
        slug: Set(model.slug),
        name: Set(model.name),
        description: Set(model.description),
        terms: Set(model.terms),
        kind: Set(model.kind),
        status: Set(model.status),
        parent_id: Set(model.parent_id),
        admins: Set(model.admins),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<models::service::Model>, ServiceError> {
        models::service::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<models::service::Model>, ServiceError> {
        models::service::Entity::find()
            .filter(models::service::Column::Slug.eq(slug.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_all(&self) -> Result<Vec<models::service::Model>, ServiceError> {
        models::service::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_children(
        &self,
        parent_id: Uuid,
        published_only: bool,
    ) -> Result<Vec<models::service::Model>, ServiceError> {
        let mut query = models::service::Entity::find()
            .filter(models::service::Column::ParentId.eq(parent_id));
        if published_only {
            query = query.filter(models::service::Column::Status.eq(PublishStatus::Published));
        }
        query
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_offers(
        &self,
        service_id: Uuid,
        public_only: bool,
    ) -> Result<Vec<OfferWithProvider>, ServiceError> {
        let mut query = models::offer::Entity::find()
            .filter(models::offer::Column::ServiceId.eq(service_id));
        if public_only {
            query = query.filter(models::offer::Column::Status.eq(OfferStatus::Public));
        }
        let rows = query
            .find_also_related(models::provider::Entity)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        rows.into_iter()
            .map(|(offer, provider)| {
                // The foreign key guarantees the provider row exists.
                let provider = provider.ok_or_else(|| {
                    ServiceError::Db(format!("offer {} has no provider row", offer.id))
                })?;
                Ok(OfferWithProvider { offer, provider })
            })
            .collect()
    }

    async fn count_children(&self, parent_id: Uuid) -> Result<u64, ServiceError> {
        models::service::Entity::find()
            .filter(models::service::Column::ParentId.eq(parent_id))
            .count(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn count_offers(&self, service_id: Uuid) -> Result<u64, ServiceError> {
        models::offer::Entity::find()
            .filter(models::offer::Column::ServiceId.eq(service_id))
            .count(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn insert(
        &self,
        model: models::service::Model,
    ) -> Result<models::service::Model, ServiceError> {
        active(model)
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn update(
        &self,
        model: models::service::Model,
    ) -> Result<models::service::Model, ServiceError> {
        active(model)
            .update(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        models::service::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(())
    }
}
