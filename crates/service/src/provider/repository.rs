use async_trait::async_trait;
use uuid::Uuid;

use models::{offer, provider, service};

use crate::errors::ServiceError;

/// An offer joined with the leaf service it targets, as attached to a
/// provider's detail view.
#[derive(Debug, Clone)]
pub struct OfferWithService {
    pub offer: offer::Model,
    pub service: service::Model,
}

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<provider::Model>, ServiceError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<provider::Model>, ServiceError>;
    async fn find_all(&self) -> Result<Vec<provider::Model>, ServiceError>;
    async fn find_offers(
        &self,
        provider_id: Uuid,
        public_only: bool,
    ) -> Result<Vec<OfferWithService>, ServiceError>;
    async fn insert(&self, model: provider::Model) -> Result<provider::Model, ServiceError>;
    async fn update(&self, model: provider::Model) -> Result<provider::Model, ServiceError>;
    /// Removes the provider and every offer that references it in one
    /// transaction. Either both disappear or neither does.
    async fn delete_with_offers(&self, id: Uuid) -> Result<(), ServiceError>;
}

pub mod mock {
    use super::*;
    use models::offer::OfferStatus;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockProviderRepository {
        providers: Mutex<HashMap<Uuid, provider::Model>>,
        offers: Mutex<Vec<OfferWithService>>,
        fail_delete: AtomicBool,
    }

    impl MockProviderRepository {
        pub fn with_providers<I: IntoIterator<Item = provider::Model>>(providers: I) -> Self {
            let repo = Self::default();
            {
                let mut map = repo.providers.lock().unwrap();
                for p in providers {
                    map.insert(p.id, p);
                }
            }
            repo
        }

        pub fn add_offer(&self, offer: offer::Model, service: service::Model) {
            self.offers.lock().unwrap().push(OfferWithService { offer, service });
        }

        pub fn get(&self, id: Uuid) -> Option<provider::Model> {
            self.providers.lock().unwrap().get(&id).cloned()
        }

        pub fn offer_count(&self) -> usize {
            self.offers.lock().unwrap().len()
        }

        /// Make the next `delete_with_offers` call fail mid-way without
        /// touching state, mimicking a rolled-back transaction.
        pub fn fail_next_delete(&self) {
            self.fail_delete.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProviderRepository for MockProviderRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<provider::Model>, ServiceError> {
            Ok(self.providers.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_slug(
            &self,
            slug: &str,
        ) -> Result<Option<provider::Model>, ServiceError> {
            Ok(self
                .providers
                .lock()
                .unwrap()
                .values()
                .find(|p| p.slug == slug)
                .cloned())
        }

        async fn find_all(&self) -> Result<Vec<provider::Model>, ServiceError> {
            Ok(self.providers.lock().unwrap().values().cloned().collect())
        }

        async fn find_offers(
            &self,
            provider_id: Uuid,
            public_only: bool,
        ) -> Result<Vec<OfferWithService>, ServiceError> {
            Ok(self
                .offers
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.offer.provider_id == provider_id)
                .filter(|o| !public_only || o.offer.status == OfferStatus::Public)
                .cloned()
                .collect())
        }

        async fn insert(
            &self,
            model: provider::Model,
        ) -> Result<provider::Model, ServiceError> {
            let mut map = self.providers.lock().unwrap();
            if map.values().any(|p| p.slug == model.slug) {
                return Err(ServiceError::Conflict("provider id taken".into()));
            }
            map.insert(model.id, model.clone());
            Ok(model)
        }

        async fn update(
            &self,
            model: provider::Model,
        ) -> Result<provider::Model, ServiceError> {
            self.providers.lock().unwrap().insert(model.id, model.clone());
            Ok(model)
        }

        async fn delete_with_offers(&self, id: Uuid) -> Result<(), ServiceError> {
            if self.fail_delete.swap(false, Ordering::SeqCst) {
                return Err(ServiceError::Db("transaction aborted".into()));
            }
            self.offers.lock().unwrap().retain(|o| o.offer.provider_id != id);
            self.providers.lock().unwrap().remove(&id);
            Ok(())
        }
    }
}
