use async_trait::async_trait;
use uuid::Uuid;

use models::{offer, provider, service};

use crate::errors::ServiceError;

/// An offer joined with the provider it belongs to, as attached to leaf
/// services in `show`.
#[derive(Debug, Clone)]
pub struct OfferWithProvider {
    pub offer: offer::Model,
    pub provider: provider::Model,
}

/// Persistence abstraction for the service forest.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<service::Model>, ServiceError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<service::Model>, ServiceError>;
    async fn find_all(&self) -> Result<Vec<service::Model>, ServiceError>;
    async fn find_children(
        &self,
        parent_id: Uuid,
        published_only: bool,
    ) -> Result<Vec<service::Model>, ServiceError>;
    async fn find_offers(
        &self,
        service_id: Uuid,
        public_only: bool,
    ) -> Result<Vec<OfferWithProvider>, ServiceError>;
    async fn count_children(&self, parent_id: Uuid) -> Result<u64, ServiceError>;
    async fn count_offers(&self, service_id: Uuid) -> Result<u64, ServiceError>;
    async fn insert(&self, model: service::Model) -> Result<service::Model, ServiceError>;
    async fn update(&self, model: service::Model) -> Result<service::Model, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use models::offer::OfferStatus;
    use models::service::PublishStatus;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCatalogRepository {
        services: Mutex<HashMap<Uuid, service::Model>>,
        offers: Mutex<Vec<OfferWithProvider>>,
    }

    impl MockCatalogRepository {
        pub fn with_services<I: IntoIterator<Item = service::Model>>(services: I) -> Self {
            let repo = Self::default();
            {
                let mut map = repo.services.lock().unwrap();
                for s in services {
                    map.insert(s.id, s);
                }
            }
            repo
        }

        pub fn add_service(&self, model: service::Model) {
            self.services.lock().unwrap().insert(model.id, model);
        }

        pub fn add_offer(&self, offer: offer::Model, provider: provider::Model) {
            self.offers.lock().unwrap().push(OfferWithProvider { offer, provider });
        }

        pub fn get(&self, id: Uuid) -> Option<service::Model> {
            self.services.lock().unwrap().get(&id).cloned()
        }

        /// Corrupt a stored parent pointer directly, bypassing validation,
        /// so tests can drive the read paths over a broken chain.
        pub fn set_parent_unchecked(&self, id: Uuid, parent_id: Option<Uuid>) {
            if let Some(s) = self.services.lock().unwrap().get_mut(&id) {
                s.parent_id = parent_id;
            }
        }
    }

    #[async_trait]
    impl CatalogRepository for MockCatalogRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<service::Model>, ServiceError> {
            Ok(self.services.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_slug(&self, slug: &str) -> Result<Option<service::Model>, ServiceError> {
            Ok(self
                .services
                .lock()
                .unwrap()
                .values()
                .find(|s| s.slug == slug)
                .cloned())
        }

        async fn find_all(&self) -> Result<Vec<service::Model>, ServiceError> {
            Ok(self.services.lock().unwrap().values().cloned().collect())
        }

        async fn find_children(
            &self,
            parent_id: Uuid,
            published_only: bool,
        ) -> Result<Vec<service::Model>, ServiceError> {
            Ok(self
                .services
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.parent_id == Some(parent_id))
                .filter(|s| !published_only || s.status == PublishStatus::Published)
                .cloned()
                .collect())
        }

        async fn find_offers(
            &self,
            service_id: Uuid,
            public_only: bool,
        ) -> Result<Vec<OfferWithProvider>, ServiceError> {
            Ok(self
                .offers
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.offer.service_id == service_id)
                .filter(|o| !public_only || o.offer.status == OfferStatus::Public)
                .cloned()
                .collect())
        }

        async fn count_children(&self, parent_id: Uuid) -> Result<u64, ServiceError> {
            Ok(self
                .services
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.parent_id == Some(parent_id))
                .count() as u64)
        }

        async fn count_offers(&self, service_id: Uuid) -> Result<u64, ServiceError> {
            Ok(self
                .offers
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.offer.service_id == service_id)
                .count() as u64)
        }

        async fn insert(&self, model: service::Model) -> Result<service::Model, ServiceError> {
            let mut map = self.services.lock().unwrap();
            if map.values().any(|s| s.slug == model.slug) {
                return Err(ServiceError::Conflict("service id taken".into()));
            }
            map.insert(model.id, model.clone());
            Ok(model)
        }

        async fn update(&self, model: service::Model) -> Result<service::Model, ServiceError> {
            let mut map = self.services.lock().unwrap();
            if !map.contains_key(&model.id) {
                return Err(ServiceError::not_found("service"));
            }
            map.insert(model.id, model.clone());
            Ok(model)
        }

        async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
            self.services.lock().unwrap().remove(&id);
            Ok(())
        }
    }
}
