use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::provider::{self, Ownership};
use models::slug;

use super::repository::{OfferWithService, ProviderRepository};
use crate::catalog::hierarchy;
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::patch::double_option;
use crate::view::{OfferView, ProviderView, ServiceView};
use crate::viewer::Viewer;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProvider {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_ownership")]
    pub ownership: Ownership,
}

fn default_ownership() -> Ownership {
    Ownership::Private
}

/// `description` is nullable: absent leaves it alone, explicit null
/// clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProvider {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub ownership: Option<Ownership>,
}

/// Providers are never hidden; the catalog repository is consulted only
/// to decide which of a provider's offers count as published.
pub struct ProviderService<P: ProviderRepository, C: CatalogRepository> {
    providers: Arc<P>,
    catalog: Arc<C>,
}

fn administers(viewer: Option<&Viewer>, model: &provider::Model) -> bool {
    viewer.map_or(false, |v| v.global_admin || model.admins.contains(&v.id))
}

impl<P: ProviderRepository, C: CatalogRepository> ProviderService<P, C> {
    pub fn new(providers: Arc<P>, catalog: Arc<C>) -> Self {
        Self { providers, catalog }
    }

    /// All providers, without offers. Admin shape only for the ones the
    /// viewer administers.
    pub async fn index(&self, viewer: Option<&Viewer>) -> Result<Vec<ProviderView>, ServiceError> {
        let mut views: Vec<ProviderView> = self
            .providers
            .find_all()
            .await?
            .iter()
            .map(|p| {
                if administers(viewer, p) {
                    ProviderView::admin(p)
                } else {
                    ProviderView::public(p)
                }
            })
            .collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(views)
    }

    pub async fn show(
        &self,
        viewer: Option<&Viewer>,
        id: &str,
    ) -> Result<Option<ProviderView>, ServiceError> {
        let Some(model) = self.providers.find_by_slug(&slug::normalize_slug(id)).await? else {
            return Ok(None);
        };
        let admin = administers(viewer, &model);
        let mut view = if admin { ProviderView::admin(&model) } else { ProviderView::public(&model) };

        let offers = self.providers.find_offers(model.id, !admin).await?;
        let mut rendered = Vec::with_capacity(offers.len());
        for row in offers {
            // Non-admins only see offers whose whole service chain is
            // published. A public offer under a draft service stays out.
            if !admin && !self.service_published(&row).await? {
                continue;
            }
            let mut ov = OfferView::from_model(&row.offer);
            ov.service = Some(Box::new(ServiceView::public(&row.service)));
            rendered.push(ov);
        }
        view.offers = Some(rendered);
        Ok(Some(view))
    }

    #[instrument(skip(self, viewer, input), fields(id = %input.id, user = %viewer.username))]
    pub async fn create(
        &self,
        viewer: &Viewer,
        input: CreateProvider,
    ) -> Result<ProviderView, ServiceError> {
        let slug_value = slug::normalize_slug(&input.id);
        slug::validate_slug(&slug_value)?;
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation("name required".into()));
        }
        if self.providers.find_by_slug(&slug_value).await?.is_some() {
            return Err(ServiceError::Conflict("provider id taken".into()));
        }
        let now = Utc::now();
        let model = provider::Model {
            id: Uuid::new_v4(),
            slug: slug_value,
            name: input.name.trim().to_string(),
            description: input.description,
            ownership: input.ownership,
            admins: vec![viewer.id],
            created_at: now.into(),
            updated_at: now.into(),
        };
        let created = self.providers.insert(model).await?;
        info!(provider = %created.slug, user = %viewer.username, "provider_created");
        Ok(ProviderView::admin(&created))
    }

    #[instrument(skip(self, viewer, patch), fields(id = %id, user = %viewer.username))]
    pub async fn update(
        &self,
        viewer: &Viewer,
        id: &str,
        patch: UpdateProvider,
    ) -> Result<(), ServiceError> {
        let mut model = self.require_admin(viewer, id).await?;
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(ServiceError::Validation("name required".into()));
            }
            model.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            model.description = description;
        }
        if let Some(ownership) = patch.ownership {
            model.ownership = ownership;
        }
        model.updated_at = Utc::now().into();
        self.providers.update(model).await?;
        Ok(())
    }

    /// Deleting a provider takes its offers with it, atomically.
    #[instrument(skip(self, viewer), fields(id = %id, user = %viewer.username))]
    pub async fn delete(&self, viewer: &Viewer, id: &str) -> Result<(), ServiceError> {
        let model = self.require_admin(viewer, id).await?;
        self.providers.delete_with_offers(model.id).await?;
        info!(provider = %model.slug, user = %viewer.username, "provider_deleted");
        Ok(())
    }

    /// Providers exist in plain sight, so an unauthorized write gets a
    /// plain refusal rather than a disappearing act.
    async fn require_admin(
        &self,
        viewer: &Viewer,
        id: &str,
    ) -> Result<provider::Model, ServiceError> {
        let model = self
            .providers
            .find_by_slug(&slug::normalize_slug(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("provider"))?;
        if !administers(Some(viewer), &model) {
            return Err(ServiceError::forbidden("not a provider admin"));
        }
        Ok(model)
    }

    async fn service_published(&self, row: &OfferWithService) -> Result<bool, ServiceError> {
        let resolved =
            hierarchy::resolve_ancestors(self.catalog.as_ref(), row.service.clone()).await?;
        Ok(resolved.is_published())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::mock::MockCatalogRepository;
    use crate::provider::repository::mock::MockProviderRepository;
    use models::offer::OfferStatus;
    use models::service::{PublishStatus, ServiceKind};

    fn provider_model(slug: &str, admins: Vec<Uuid>) -> provider::Model {
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

    fn service_model(slug: &str, status: PublishStatus) -> models::service::Model {
        let now = Utc::now();
        models::service::Model {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: slug.to_ascii_uppercase(),
            description: None,
            terms: None,
            kind: ServiceKind::Service,
            status,
            parent_id: None,
            admins: vec![],
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn offer_model(service_id: Uuid, provider_id: Uuid, status: OfferStatus) -> models::offer::Model {
        let now = Utc::now();
        models::offer::Model {
            id: Uuid::new_v4(),
            service_id,
            provider_id,
            status,
            description: None,
            landing: "https://example.com".into(),
            location: "Remote".into(),
            price_currency: "EUR".into(),
            price_amount: 99.0,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn viewer(id: Uuid) -> Viewer {
        Viewer { id, username: "u".into(), global_admin: false }
    }

    fn setup(
        providers: Vec<provider::Model>,
        services: Vec<models::service::Model>,
    ) -> (Arc<MockProviderRepository>, ProviderService<MockProviderRepository, MockCatalogRepository>)
    {
        let provider_repo = Arc::new(MockProviderRepository::with_providers(providers));
        let catalog_repo = Arc::new(MockCatalogRepository::with_services(services));
        let service = ProviderService::new(provider_repo.clone(), catalog_repo);
        (provider_repo, service)
    }

    #[tokio::test]
    async fn public_show_drops_offers_under_draft_services() {
        let p = provider_model("acme", vec![Uuid::new_v4()]);
        let published = service_model("live", PublishStatus::Published);
        let draft = service_model("hidden", PublishStatus::Draft);
        let (repo, svc) = setup(vec![p.clone()], vec![published.clone(), draft.clone()]);
        repo.add_offer(offer_model(published.id, p.id, OfferStatus::Public), published.clone());
        repo.add_offer(offer_model(draft.id, p.id, OfferStatus::Public), draft.clone());
        repo.add_offer(offer_model(published.id, p.id, OfferStatus::Draft), published);

        let view = svc.show(None, "acme").await.unwrap().unwrap();
        assert!(view.admins.is_none());
        let offers = view.offers.unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].service.as_ref().unwrap().id, "live");
    }

    #[tokio::test]
    async fn admin_show_includes_every_offer() {
        let admin = Uuid::new_v4();
        let p = provider_model("acme", vec![admin]);
        let published = service_model("live", PublishStatus::Published);
        let draft = service_model("hidden", PublishStatus::Draft);
        let (repo, svc) = setup(vec![p.clone()], vec![published.clone(), draft.clone()]);
        repo.add_offer(offer_model(published.id, p.id, OfferStatus::Public), published);
        repo.add_offer(offer_model(draft.id, p.id, OfferStatus::Public), draft);

        let view = svc.show(Some(&viewer(admin)), "acme").await.unwrap().unwrap();
        assert_eq!(view.admins.as_deref(), Some(&[admin][..]));
        assert_eq!(view.offers.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_makes_the_creator_admin() {
        let (_, svc) = setup(vec![provider_model("taken", vec![])], vec![]);
        let u = viewer(Uuid::new_v4());

        let input = |id: &str| CreateProvider {
            id: id.into(),
            name: "Acme".into(),
            description: None,
            ownership: Ownership::Private,
        };
        let err = svc.create(&u, input("taken")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let view = svc.create(&u, input("fresh")).await.unwrap();
        assert_eq!(view.admins.unwrap(), vec![u.id]);
    }

    #[tokio::test]
    async fn writes_by_non_admins_are_refused() {
        let p = provider_model("acme", vec![Uuid::new_v4()]);
        let (repo, svc) = setup(vec![p.clone()], vec![]);
        let outsider = viewer(Uuid::new_v4());

        let err = svc.update(&outsider, "acme", UpdateProvider::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = svc.delete(&outsider, "acme").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(repo.get(p.id).is_some());
    }

    #[tokio::test]
    async fn patch_with_explicit_null_clears_description() {
        let admin = Uuid::new_v4();
        let mut p = provider_model("acme", vec![admin]);
        p.description = Some("about".into());
        let (repo, svc) = setup(vec![p.clone()], vec![]);
        let u = viewer(admin);

        let patch: UpdateProvider = serde_json::from_str(r#"{"name": "Acme"}"#).unwrap();
        svc.update(&u, "acme", patch).await.unwrap();
        assert_eq!(repo.get(p.id).unwrap().description.as_deref(), Some("about"));

        let patch: UpdateProvider = serde_json::from_str(r#"{"description": null}"#).unwrap();
        svc.update(&u, "acme", patch).await.unwrap();
        assert_eq!(repo.get(p.id).unwrap().description, None);
    }

    #[tokio::test]
    async fn delete_removes_the_offers_with_the_provider() {
        let admin = Uuid::new_v4();
        let p = provider_model("acme", vec![admin]);
        let s = service_model("live", PublishStatus::Published);
        let (repo, svc) = setup(vec![p.clone()], vec![s.clone()]);
        repo.add_offer(offer_model(s.id, p.id, OfferStatus::Public), s);

        svc.delete(&viewer(admin), "acme").await.unwrap();
        assert!(repo.get(p.id).is_none());
        assert_eq!(repo.offer_count(), 0);
    }

    #[tokio::test]
    async fn failed_offer_removal_keeps_the_provider() {
        let admin = Uuid::new_v4();
        let p = provider_model("acme", vec![admin]);
        let s = service_model("live", PublishStatus::Published);
        let (repo, svc) = setup(vec![p.clone()], vec![s.clone()]);
        repo.add_offer(offer_model(s.id, p.id, OfferStatus::Public), s);
        repo.fail_next_delete();

        let err = svc.delete(&viewer(admin), "acme").await.unwrap_err();
        assert!(matches!(err, ServiceError::Db(_)));
        assert!(repo.get(p.id).is_some());
        assert_eq!(repo.offer_count(), 1);
    }
}
