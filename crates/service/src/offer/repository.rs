use async_trait::async_trait;
use uuid::Uuid;

use models::offer;

use crate::errors::ServiceError;

#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<offer::Model>, ServiceError>;
    async fn insert(&self, model: offer::Model) -> Result<offer::Model, ServiceError>;
    async fn update(&self, model: offer::Model) -> Result<offer::Model, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}

pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockOfferRepository {
        offers: Mutex<HashMap<Uuid, offer::Model>>,
    }

    impl MockOfferRepository {
        pub fn with_offers<I: IntoIterator<Item = offer::Model>>(offers: I) -> Self {
            let repo = Self::default();
            {
                let mut map = repo.offers.lock().unwrap();
                for o in offers {
                    map.insert(o.id, o);
                }
            }
            repo
        }

        pub fn get(&self, id: Uuid) -> Option<offer::Model> {
            self.offers.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl OfferRepository for MockOfferRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<offer::Model>, ServiceError> {
            Ok(self.offers.lock().unwrap().get(&id).cloned())
        }

        async fn insert(&self, model: offer::Model) -> Result<offer::Model, ServiceError> {
            self.offers.lock().unwrap().insert(model.id, model.clone());
            Ok(model)
        }

        async fn update(&self, model: offer::Model) -> Result<offer::Model, ServiceError> {
            self.offers.lock().unwrap().insert(model.id, model.clone());
            Ok(model)
        }

        async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
            self.offers.lock().unwrap().remove(&id);
            Ok(())
        }
    }
}
