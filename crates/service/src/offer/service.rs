use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::offer::{self, OfferStatus};
use models::service::ServiceKind;
use models::slug;
use models::{provider, service as service_model};

use super::repository::OfferRepository;
use crate::catalog::hierarchy::{self, ResolvedService};
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::patch::double_option;
use crate::provider::repository::ProviderRepository;
use crate::view::{OfferView, ProviderView, ServiceView};
use crate::viewer::Viewer;

#[derive(Debug, Clone, Deserialize)]
pub struct PriceInput {
    pub currency: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOffer {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    pub status: OfferStatus,
    #[serde(default)]
    pub description: Option<String>,
    pub landing: String,
    pub location: String,
    pub price: PriceInput,
}

/// `description` is nullable: absent leaves it alone, explicit null
/// clears it. The other fields are required columns and only accept
/// replacement values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOffer {
    #[serde(default)]
    pub status: Option<OfferStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub landing: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default, rename = "serviceId")]
    pub service_id: Option<String>,
    #[serde(default, rename = "providerId")]
    pub provider_id: Option<String>,
}

/// An offer with both of its endpoints loaded. The service side carries
/// its full ancestor chain so publish and admin checks stay pure.
struct PopulatedOffer {
    offer: offer::Model,
    service: ResolvedService,
    provider: provider::Model,
}

impl PopulatedOffer {
    /// Administering the service chain or the provider each suffice.
    fn is_administered_by(&self, viewer: Option<&Viewer>) -> bool {
        self.service.is_administered_by(viewer)
            || viewer.map_or(false, |v| self.provider.admins.contains(&v.id))
    }

    /// Visible to the public only when both the offer and the whole
    /// service chain are published.
    fn is_published(&self) -> bool {
        self.offer.status == OfferStatus::Public && self.service.is_published()
    }
}

pub struct OfferService<O: OfferRepository, C: CatalogRepository, P: ProviderRepository> {
    offers: Arc<O>,
    catalog: Arc<C>,
    providers: Arc<P>,
}

impl<O: OfferRepository, C: CatalogRepository, P: ProviderRepository> OfferService<O, C, P> {
    pub fn new(offers: Arc<O>, catalog: Arc<C>, providers: Arc<P>) -> Self {
        Self { offers, catalog, providers }
    }

    pub async fn show(
        &self,
        viewer: Option<&Viewer>,
        id: Uuid,
    ) -> Result<Option<OfferView>, ServiceError> {
        let Some(model) = self.offers.find_by_id(id).await? else {
            return Ok(None);
        };
        let populated = self.populate(model).await?;
        if !populated.is_administered_by(viewer) && !populated.is_published() {
            return Ok(None);
        }
        let mut view = OfferView::from_model(&populated.offer);
        view.service = Some(Box::new(ServiceView::public(&populated.service.node)));
        view.provider = Some(Box::new(ProviderView::public(&populated.provider)));
        Ok(Some(view))
    }

    /// Offers are created through their provider. The target service must
    /// already exist and must be a leaf, never a category.
    #[instrument(skip(self, viewer, input), fields(provider = %provider_id, user = %viewer.username))]
    pub async fn create_for_provider(
        &self,
        viewer: &Viewer,
        provider_id: &str,
        input: CreateOffer,
    ) -> Result<OfferView, ServiceError> {
        let provider = self
            .providers
            .find_by_slug(&slug::normalize_slug(provider_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("provider"))?;
        if !viewer.global_admin && !provider.admins.contains(&viewer.id) {
            return Err(ServiceError::forbidden("not a provider admin"));
        }
        let service = self.translate_service(&input.service_id).await?;

        offer::validate_landing(&input.landing)?;
        offer::validate_price(&input.price.currency, input.price.amount)?;

        let now = Utc::now();
        let model = offer::Model {
            id: Uuid::new_v4(),
            service_id: service.id,
            provider_id: provider.id,
            status: input.status,
            description: input.description,
            landing: input.landing,
            location: input.location,
            price_currency: input.price.currency,
            price_amount: input.price.amount,
            created_at: now.into(),
            updated_at: now.into(),
        };
        let created = self.offers.insert(model).await?;
        info!(offer = %created.id, provider = %provider.slug, user = %viewer.username, "offer_created");

        let mut view = OfferView::from_model(&created);
        view.service = Some(Box::new(ServiceView::public(&service)));
        view.provider = Some(Box::new(ProviderView::public(&provider)));
        Ok(view)
    }

    #[instrument(skip(self, viewer, patch), fields(offer = %id, user = %viewer.username))]
    pub async fn update(
        &self,
        viewer: &Viewer,
        id: Uuid,
        patch: UpdateOffer,
    ) -> Result<(), ServiceError> {
        let model = self
            .offers
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("offer"))?;
        let populated = self.populate(model).await?;
        if !populated.is_administered_by(Some(viewer)) {
            return Err(ServiceError::forbidden("not an offer admin"));
        }

        // Both re-homing targets are translated before anything is
        // touched, so a bad id aborts the whole update.
        let new_service = match &patch.service_id {
            None => None,
            Some(service_slug) => Some(self.translate_service(service_slug).await?),
        };
        let new_provider = match &patch.provider_id {
            None => None,
            Some(provider_slug) => {
                let target = self
                    .providers
                    .find_by_slug(&slug::normalize_slug(provider_slug))
                    .await?
                    .ok_or_else(|| ServiceError::Validation("provider not found".into()))?;
                // Moving an offer onto a provider is that provider's call.
                if !viewer.global_admin && !target.admins.contains(&viewer.id) {
                    return Err(ServiceError::forbidden("not an admin of the target provider"));
                }
                Some(target)
            }
        };

        let mut model = populated.offer;
        if let Some(service) = new_service {
            model.service_id = service.id;
        }
        if let Some(provider) = new_provider {
            model.provider_id = provider.id;
        }
        if let Some(status) = patch.status {
            model.status = status;
        }
        if let Some(description) = patch.description {
            model.description = description;
        }
        if let Some(landing) = patch.landing {
            offer::validate_landing(&landing)?;
            model.landing = landing;
        }
        if let Some(location) = patch.location {
            model.location = location;
        }
        if let Some(price) = patch.price {
            offer::validate_price(&price.currency, price.amount)?;
            model.price_currency = price.currency;
            model.price_amount = price.amount;
        }
        model.updated_at = Utc::now().into();
        self.offers.update(model).await?;
        Ok(())
    }

    #[instrument(skip(self, viewer), fields(offer = %id, user = %viewer.username))]
    pub async fn delete(&self, viewer: &Viewer, id: Uuid) -> Result<(), ServiceError> {
        let model = self
            .offers
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("offer"))?;
        let populated = self.populate(model).await?;
        if !populated.is_administered_by(Some(viewer)) {
            return Err(ServiceError::forbidden("not an offer admin"));
        }
        self.offers.delete(id).await?;
        info!(offer = %id, user = %viewer.username, "offer_deleted");
        Ok(())
    }

    async fn populate(&self, model: offer::Model) -> Result<PopulatedOffer, ServiceError> {
        let service = self
            .catalog
            .find_by_id(model.service_id)
            .await?
            .ok_or_else(|| {
                ServiceError::Db(format!("offer {} references missing service", model.id))
            })?;
        let service = hierarchy::resolve_ancestors(self.catalog.as_ref(), service).await?;
        let provider = self
            .providers
            .find_by_id(model.provider_id)
            .await?
            .ok_or_else(|| {
                ServiceError::Db(format!("offer {} references missing provider", model.id))
            })?;
        Ok(PopulatedOffer { offer: model, service, provider })
    }

    async fn translate_service(
        &self,
        service_slug: &str,
    ) -> Result<service_model::Model, ServiceError> {
        let service = self
            .catalog
            .find_by_slug(&slug::normalize_slug(service_slug))
            .await?
            .ok_or_else(|| ServiceError::Validation("service not found".into()))?;
        if service.kind != ServiceKind::Service {
            return Err(ServiceError::Validation("offers attach to services, not categories".into()));
        }
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::mock::MockCatalogRepository;
    use crate::offer::repository::mock::MockOfferRepository;
    use crate::provider::repository::mock::MockProviderRepository;
    use models::provider::Ownership;
    use models::service::PublishStatus;

    fn service_entry(
        slug: &str,
        kind: ServiceKind,
        status: PublishStatus,
        parent: Option<Uuid>,
        admins: Vec<Uuid>,
    ) -> service_model::Model {
        let now = Utc::now();
        service_model::Model {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: slug.to_ascii_uppercase(),
            description: None,
            terms: None,
            kind,
            status,
            parent_id: parent,
            admins,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn provider_entry(slug: &str, admins: Vec<Uuid>) -> provider::Model {
        let now = Utc::now();
        provider::Model {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: slug.to_ascii_uppercase(),
            description: None,
            ownership: Ownership::Private,
            admins,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn offer_entry(service_id: Uuid, provider_id: Uuid, status: OfferStatus) -> offer::Model {
        let now = Utc::now();
        offer::Model {
            id: Uuid::new_v4(),
            service_id,
            provider_id,
            status,
            description: None,
            landing: "https://example.com/offer".into(),
            location: "Berlin".into(),
            price_currency: "EUR".into(),
            price_amount: 120.0,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn viewer(id: Uuid) -> Viewer {
        Viewer { id, username: "u".into(), global_admin: false }
    }

    type Mocked =
        OfferService<MockOfferRepository, MockCatalogRepository, MockProviderRepository>;

    fn setup(
        services: Vec<service_model::Model>,
        providers: Vec<provider::Model>,
        offers: Vec<offer::Model>,
    ) -> (Arc<MockOfferRepository>, Mocked) {
        let offer_repo = Arc::new(MockOfferRepository::with_offers(offers));
        let catalog_repo = Arc::new(MockCatalogRepository::with_services(services));
        let provider_repo = Arc::new(MockProviderRepository::with_providers(providers));
        let service = OfferService::new(offer_repo.clone(), catalog_repo, provider_repo);
        (offer_repo, service)
    }

    fn create_input(service_slug: &str) -> CreateOffer {
        CreateOffer {
            service_id: service_slug.into(),
            status: OfferStatus::Public,
            description: None,
            landing: "https://example.com/offer".into(),
            location: "Berlin".into(),
            price: PriceInput { currency: "EUR".into(), amount: 120.0 },
        }
    }

    #[tokio::test]
    async fn public_offer_under_draft_service_is_invisible() {
        let draft = service_entry("draft", ServiceKind::Service, PublishStatus::Draft, None, vec![]);
        let p = provider_entry("acme", vec![]);
        let o = offer_entry(draft.id, p.id, OfferStatus::Public);
        let (_, svc) = setup(vec![draft], vec![p], vec![o.clone()]);

        assert!(svc.show(None, o.id).await.unwrap().is_none());
        assert!(svc.show(Some(&viewer(Uuid::new_v4())), o.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn service_ancestor_admin_and_provider_admin_both_see_the_offer() {
        let chain_admin = Uuid::new_v4();
        let provider_admin = Uuid::new_v4();
        let root = service_entry(
            "root",
            ServiceKind::Category,
            PublishStatus::Draft,
            None,
            vec![chain_admin],
        );
        let leaf = service_entry(
            "leaf",
            ServiceKind::Service,
            PublishStatus::Draft,
            Some(root.id),
            vec![],
        );
        let p = provider_entry("acme", vec![provider_admin]);
        let o = offer_entry(leaf.id, p.id, OfferStatus::Draft);
        let (_, svc) = setup(vec![root, leaf], vec![p], vec![o.clone()]);

        assert!(svc.show(Some(&viewer(chain_admin)), o.id).await.unwrap().is_some());
        assert!(svc.show(Some(&viewer(provider_admin)), o.id).await.unwrap().is_some());
        assert!(svc.show(Some(&viewer(Uuid::new_v4())), o.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_requires_provider_admin_and_a_leaf_service() {
        let admin = Uuid::new_v4();
        let leaf =
            service_entry("leaf", ServiceKind::Service, PublishStatus::Published, None, vec![]);
        let category =
            service_entry("cat", ServiceKind::Category, PublishStatus::Published, None, vec![]);
        let p = provider_entry("acme", vec![admin]);
        let (repo, svc) = setup(vec![leaf, category], vec![p], vec![]);

        let err = svc
            .create_for_provider(&viewer(Uuid::new_v4()), "acme", create_input("leaf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = svc
            .create_for_provider(&viewer(admin), "acme", create_input("cat"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let view = svc
            .create_for_provider(&viewer(admin), "acme", create_input("leaf"))
            .await
            .unwrap();
        assert!(repo.get(view.id).is_some());
        assert_eq!(view.service.unwrap().id, "leaf");
    }

    #[tokio::test]
    async fn update_aborts_before_mutating_when_a_target_is_missing() {
        let admin = Uuid::new_v4();
        let leaf =
            service_entry("leaf", ServiceKind::Service, PublishStatus::Published, None, vec![]);
        let p = provider_entry("acme", vec![admin]);
        let o = offer_entry(leaf.id, p.id, OfferStatus::Public);
        let (repo, svc) = setup(vec![leaf.clone()], vec![p], vec![o.clone()]);

        let patch = UpdateOffer {
            status: Some(OfferStatus::Draft),
            service_id: Some("no-such".into()),
            ..Default::default()
        };
        let err = svc.update(&viewer(admin), o.id, patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(repo.get(o.id).unwrap().status, OfferStatus::Public);
    }

    #[tokio::test]
    async fn rehoming_to_a_foreign_provider_is_forbidden() {
        let admin = Uuid::new_v4();
        let leaf =
            service_entry("leaf", ServiceKind::Service, PublishStatus::Published, None, vec![]);
        let mine = provider_entry("mine", vec![admin]);
        let theirs = provider_entry("theirs", vec![Uuid::new_v4()]);
        let o = offer_entry(leaf.id, mine.id, OfferStatus::Public);
        let (repo, svc) = setup(vec![leaf], vec![mine.clone(), theirs], vec![o.clone()]);

        let patch = UpdateOffer { provider_id: Some("theirs".into()), ..Default::default() };
        let err = svc.update(&viewer(admin), o.id, patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert_eq!(repo.get(o.id).unwrap().provider_id, mine.id);
    }

    #[tokio::test]
    async fn patch_with_explicit_null_clears_description() {
        let admin = Uuid::new_v4();
        let leaf =
            service_entry("leaf", ServiceKind::Service, PublishStatus::Published, None, vec![]);
        let p = provider_entry("acme", vec![admin]);
        let mut o = offer_entry(leaf.id, p.id, OfferStatus::Public);
        o.description = Some("about".into());
        let (repo, svc) = setup(vec![leaf], vec![p], vec![o.clone()]);
        let u = viewer(admin);

        let patch: UpdateOffer = serde_json::from_str(r#"{"location": "Hamburg"}"#).unwrap();
        svc.update(&u, o.id, patch).await.unwrap();
        assert_eq!(repo.get(o.id).unwrap().description.as_deref(), Some("about"));

        let patch: UpdateOffer = serde_json::from_str(r#"{"description": null}"#).unwrap();
        svc.update(&u, o.id, patch).await.unwrap();
        assert_eq!(repo.get(o.id).unwrap().description, None);
    }

    #[tokio::test]
    async fn delete_requires_an_admin_on_either_side() {
        let provider_admin = Uuid::new_v4();
        let leaf =
            service_entry("leaf", ServiceKind::Service, PublishStatus::Published, None, vec![]);
        let p = provider_entry("acme", vec![provider_admin]);
        let o = offer_entry(leaf.id, p.id, OfferStatus::Public);
        let (repo, svc) = setup(vec![leaf], vec![p], vec![o.clone()]);

        let err = svc.delete(&viewer(Uuid::new_v4()), o.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        svc.delete(&viewer(provider_admin), o.id).await.unwrap();
        assert!(repo.get(o.id).is_none());
    }
}
