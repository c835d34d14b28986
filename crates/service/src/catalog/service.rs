use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::service::{self, PublishStatus, ServiceKind};
use models::slug;

use super::hierarchy::{self, ResolvedService};
use super::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::patch::double_option;
use crate::view::{OfferView, ProviderView, ServiceIndexEntry, ServiceView};
use crate::viewer::Viewer;

/// Creation input. `parentId` carries the parent's human-readable id and
/// is translated to the internal key before anything is persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateService {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    pub status: PublishStatus,
    #[serde(default, rename = "parentId")]
    pub parent_id: Option<String>,
}

/// Update input. The nullable fields distinguish three cases: absent
/// (leave alone), explicit null (clear; for `parentId`, re-root), and a
/// value (replace; for `parentId`, re-parent).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateService {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub terms: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<PublishStatus>,
    #[serde(default, rename = "parentId", deserialize_with = "double_option")]
    pub parent_id: Option<Option<String>>,
}

/// Application service over the service forest. Read paths hide
/// unauthorized nodes by yielding `Ok(None)` or `NotFound`, never
/// `Forbidden`, so the HTTP layer cannot leak existence.
pub struct CatalogService<R: CatalogRepository> {
    repo: Arc<R>,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Per-viewer projection of one service: admin shape, public shape,
    /// or not visible (`Ok(None)`, mapped to 404 upstream).
    pub async fn show(
        &self,
        viewer: Option<&Viewer>,
        id: &str,
    ) -> Result<Option<ServiceView>, ServiceError> {
        let Some(model) = self.repo.find_by_slug(&slug::normalize_slug(id)).await? else {
            return Ok(None);
        };
        let resolved = hierarchy::resolve_ancestors(self.repo.as_ref(), model).await?;
        if resolved.is_administered_by(viewer) {
            return Ok(Some(self.render_admin(&resolved, viewer).await?));
        }
        if resolved.is_published() {
            return Ok(Some(self.render_public(&resolved).await?));
        }
        Ok(None)
    }

    /// Flat list of every service the viewer may see, annotated with the
    /// direct parent's slug. Invisible services are omitted entirely.
    /// `level_limit` caps root-relative depth (roots are level 0).
    pub async fn index(
        &self,
        viewer: Option<&Viewer>,
        level_limit: Option<usize>,
    ) -> Result<Vec<ServiceIndexEntry>, ServiceError> {
        let all = self.repo.find_all().await?;
        let by_id: HashMap<Uuid, service::Model> =
            all.iter().map(|s| (s.id, s.clone())).collect();

        let mut entries = Vec::new();
        for model in all {
            let resolved = match hierarchy::resolve_from_map(model, &by_id) {
                Ok(resolved) => resolved,
                Err(err) => {
                    // A corrupted chain must not take the whole index down.
                    warn!(error = %err, "skipping service with unresolvable ancestry");
                    continue;
                }
            };
            if let Some(limit) = level_limit {
                if resolved.depth() > limit {
                    continue;
                }
            }
            let administered = resolved.is_administered_by(viewer);
            if !administered && !resolved.is_published() {
                continue;
            }
            entries.push(ServiceIndexEntry {
                id: resolved.node.slug.clone(),
                name: resolved.node.name.clone(),
                description: resolved.node.description.clone(),
                kind: resolved.node.kind,
                status: resolved.node.status,
                parent_id: resolved.ancestors.first().map(|p| p.slug.clone()),
                admins: administered.then(|| resolved.node.admins.clone()),
            });
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    #[instrument(skip(self, viewer, input), fields(id = %input.id, user = %viewer.username))]
    pub async fn create(
        &self,
        viewer: &Viewer,
        input: CreateService,
    ) -> Result<ServiceView, ServiceError> {
        let slug_value = slug::normalize_slug(&input.id);
        slug::validate_slug(&slug_value)?;
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation("name required".into()));
        }
        if self.repo.find_by_slug(&slug_value).await?.is_some() {
            return Err(ServiceError::Conflict("service id taken".into()));
        }

        let parent_id = match &input.parent_id {
            None => None,
            Some(parent_slug) => Some(self.authorize_parent(viewer, parent_slug, None).await?),
        };

        let now = Utc::now();
        let model = service::Model {
            id: Uuid::new_v4(),
            slug: slug_value,
            name: input.name.trim().to_string(),
            description: input.description,
            terms: input.terms,
            kind: input.kind,
            status: input.status,
            parent_id,
            admins: vec![viewer.id],
            created_at: now.into(),
            updated_at: now.into(),
        };
        let created = self.repo.insert(model).await?;
        info!(service = %created.slug, user = %viewer.username, "service_created");

        let resolved = hierarchy::resolve_ancestors(self.repo.as_ref(), created).await?;
        self.render_admin(&resolved, Some(viewer)).await
    }

    #[instrument(skip(self, viewer, patch), fields(id = %id, user = %viewer.username))]
    pub async fn update(
        &self,
        viewer: &Viewer,
        id: &str,
        patch: UpdateService,
    ) -> Result<(), ServiceError> {
        let Some(mut model) = self.repo.find_by_slug(&slug::normalize_slug(id)).await? else {
            return Err(ServiceError::not_found("service"));
        };
        let resolved = hierarchy::resolve_ancestors(self.repo.as_ref(), model.clone()).await?;
        if !resolved.is_administered_by(Some(viewer)) {
            // Hide existence from non-admins, published or not.
            return Err(ServiceError::not_found("service"));
        }

        if let Some(parent_patch) = patch.parent_id {
            model.parent_id = match parent_patch {
                None => None,
                Some(parent_slug) => {
                    Some(self.authorize_parent(viewer, &parent_slug, Some(&model)).await?)
                }
            };
        }
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(ServiceError::Validation("name required".into()));
            }
            model.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            model.description = description;
        }
        if let Some(terms) = patch.terms {
            model.terms = terms;
        }
        if let Some(status) = patch.status {
            model.status = status;
        }
        model.updated_at = Utc::now().into();

        self.repo.update(model).await?;
        Ok(())
    }

    /// A leaf may be deleted only while it has no offers; a category only
    /// while it has no children.
    #[instrument(skip(self, viewer), fields(id = %id, user = %viewer.username))]
    pub async fn delete(&self, viewer: &Viewer, id: &str) -> Result<(), ServiceError> {
        let Some(model) = self.repo.find_by_slug(&slug::normalize_slug(id)).await? else {
            return Err(ServiceError::not_found("service"));
        };
        let resolved = hierarchy::resolve_ancestors(self.repo.as_ref(), model.clone()).await?;
        if !resolved.is_administered_by(Some(viewer)) {
            return Err(ServiceError::not_found("service"));
        }
        match model.kind {
            ServiceKind::Service => {
                if self.repo.count_offers(model.id).await? > 0 {
                    return Err(ServiceError::Conflict("service still has offers".into()));
                }
            }
            ServiceKind::Category => {
                if self.repo.count_children(model.id).await? > 0 {
                    return Err(ServiceError::Conflict("category still has children".into()));
                }
            }
        }
        self.repo.delete(model.id).await?;
        info!(service = %model.slug, user = %viewer.username, "service_deleted");
        Ok(())
    }

    /// Translate a candidate parent slug and enforce the write-time
    /// invariants: the parent must exist and be a category, the move must
    /// not create a cycle, and the viewer must administer the *new*
    /// chain. An existing-but-hidden parent reads as "not found" so that
    /// drafts stay invisible.
    async fn authorize_parent(
        &self,
        viewer: &Viewer,
        parent_slug: &str,
        child: Option<&service::Model>,
    ) -> Result<Uuid, ServiceError> {
        let parent = self
            .repo
            .find_by_slug(&slug::normalize_slug(parent_slug))
            .await?
            .ok_or_else(|| ServiceError::Validation("parent not found".into()))?;
        if parent.kind != ServiceKind::Category {
            return Err(ServiceError::Validation("parent must be a category".into()));
        }
        if let Some(child) = child {
            if parent.id == child.id {
                return Err(ServiceError::Validation("parent cycle".into()));
            }
        }
        let parent_resolved =
            hierarchy::resolve_ancestors(self.repo.as_ref(), parent.clone()).await?;
        if let Some(child) = child {
            if parent_resolved.has_ancestor(child.id) {
                return Err(ServiceError::Validation("parent cycle".into()));
            }
        }

        // Admin rights must hold against the new chain. The service's own
        // admin list travels with it; rights inherited from the old parent
        // do not.
        let own_admin = viewer.global_admin
            || child.map_or(false, |c| c.admins.contains(&viewer.id));
        if !own_admin && !parent_resolved.is_administered_by(Some(viewer)) {
            if parent_resolved.is_published() {
                return Err(ServiceError::forbidden("not an admin of the target parent"));
            }
            return Err(ServiceError::Validation("parent not found".into()));
        }
        Ok(parent.id)
    }

    async fn render_admin(
        &self,
        resolved: &ResolvedService,
        viewer: Option<&Viewer>,
    ) -> Result<ServiceView, ServiceError> {
        let mut view = ServiceView::admin(&resolved.node);
        view.parent = render_parent_chain(resolved, viewer);
        match resolved.node.kind {
            ServiceKind::Category => {
                // Admins see draft children too, for support purposes.
                let children = self.repo.find_children(resolved.node.id, false).await?;
                let mut rendered = Vec::with_capacity(children.len());
                for child in children {
                    let child_resolved = ResolvedService {
                        node: child,
                        ancestors: std::iter::once(resolved.node.clone())
                            .chain(resolved.ancestors.iter().cloned())
                            .collect(),
                    };
                    // Each child's visibility is evaluated on its own chain.
                    let rendered_child = if child_resolved.is_administered_by(viewer) {
                        ServiceView::admin(&child_resolved.node)
                    } else {
                        ServiceView::public(&child_resolved.node)
                    };
                    rendered.push(rendered_child);
                }
                view.children = Some(rendered);
            }
            ServiceKind::Service => {
                let offers = self.repo.find_offers(resolved.node.id, false).await?;
                view.offers = Some(
                    offers
                        .iter()
                        .map(|o| {
                            let mut ov = OfferView::from_model(&o.offer);
                            // No need to leak provider admin membership here.
                            ov.provider = Some(Box::new(ProviderView::public(&o.provider)));
                            ov
                        })
                        .collect(),
                );
            }
        }
        Ok(view)
    }

    async fn render_public(&self, resolved: &ResolvedService) -> Result<ServiceView, ServiceError> {
        let mut view = ServiceView::public(&resolved.node);
        view.parent = render_parent_chain(resolved, None);
        match resolved.node.kind {
            ServiceKind::Category => {
                // Only published children, rendered by the same public rule,
                // one level deep.
                let children = self.repo.find_children(resolved.node.id, true).await?;
                view.children = Some(children.iter().map(ServiceView::public).collect());
            }
            ServiceKind::Service => {
                // This node is known published, so a public offer here is
                // published by definition.
                let offers = self.repo.find_offers(resolved.node.id, true).await?;
                view.offers = Some(
                    offers
                        .iter()
                        .map(|o| {
                            let mut ov = OfferView::from_model(&o.offer);
                            ov.provider = Some(Box::new(ProviderView::public(&o.provider)));
                            ov
                        })
                        .collect(),
                );
            }
        }
        Ok(view)
    }
}

/// Nest the ancestor chain root-downward. Each ancestor is rendered in
/// admin shape only if the viewer administers that ancestor through its
/// own suffix of the chain.
fn render_parent_chain(
    resolved: &ResolvedService,
    viewer: Option<&Viewer>,
) -> Option<Box<ServiceView>> {
    let mut acc: Option<Box<ServiceView>> = None;
    for index in (0..resolved.ancestors.len()).rev() {
        let ancestor = &resolved.ancestors[index];
        let mut view = if resolved.administers_ancestor(index, viewer) {
            ServiceView::admin(ancestor)
        } else {
            ServiceView::public(ancestor)
        };
        view.parent = acc;
        acc = Some(Box::new(view));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::mock::MockCatalogRepository;
    use models::offer::OfferStatus;
    use models::provider::Ownership;

    fn svc(
        slug: &str,
        kind: ServiceKind,
        status: PublishStatus,
        parent: Option<Uuid>,
        admins: Vec<Uuid>,
    ) -> service::Model {
        let now = Utc::now();
        service::Model {
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

    fn provider_model(slug: &str) -> models::provider::Model {
        let now = Utc::now();
        models::provider::Model {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: slug.to_ascii_uppercase(),
            description: None,
            ownership: Ownership::Private,
            admins: vec![Uuid::new_v4()],
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
            location: "Halifax, NS".into(),
            price_currency: "CAD".into(),
            price_amount: 40.0,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn viewer(id: Uuid) -> Viewer {
        Viewer { id, username: "u".into(), global_admin: false }
    }

    #[tokio::test]
    async fn draft_child_is_hidden_but_published_root_is_indexed() {
        // Service A (root, published) -> Service B (child, draft); U is no admin.
        let a = svc("a", ServiceKind::Category, PublishStatus::Published, None, vec![]);
        let b = svc("b", ServiceKind::Service, PublishStatus::Draft, Some(a.id), vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([a.clone(), b.clone()]));
        let catalog = CatalogService::new(repo);
        let u = viewer(Uuid::new_v4());

        assert!(catalog.show(Some(&u), "b").await.unwrap().is_none());

        let index = catalog.index(Some(&u), None).await.unwrap();
        let ids: Vec<_> = index.iter().map(|e| e.id.as_str()).collect();
        assert!(ids.contains(&"a"));
        assert!(!ids.contains(&"b"));
    }

    #[tokio::test]
    async fn index_annotates_parent_slug_and_caps_level() {
        let admin = Uuid::new_v4();
        let root = svc("root", ServiceKind::Category, PublishStatus::Published, None, vec![admin]);
        let child = svc("child", ServiceKind::Category, PublishStatus::Published, Some(root.id), vec![]);
        let grand = svc("grand", ServiceKind::Service, PublishStatus::Published, Some(child.id), vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([root, child, grand]));
        let catalog = CatalogService::new(repo);

        let all = catalog.index(None, None).await.unwrap();
        assert_eq!(all.len(), 3);
        let child_entry = all.iter().find(|e| e.id == "child").unwrap();
        assert_eq!(child_entry.parent_id.as_deref(), Some("root"));
        // Anonymous viewers never see admin sets.
        assert!(all.iter().all(|e| e.admins.is_none()));

        let capped = catalog.index(None, Some(1)).await.unwrap();
        let ids: Vec<_> = capped.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["child", "root"]);
    }

    #[tokio::test]
    async fn index_attaches_admins_only_for_administered_entries() {
        let admin = Uuid::new_v4();
        let root = svc("root", ServiceKind::Category, PublishStatus::Published, None, vec![admin]);
        let other = svc("other", ServiceKind::Category, PublishStatus::Published, None, vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([root, other]));
        let catalog = CatalogService::new(repo);

        let index = catalog.index(Some(&viewer(admin)), None).await.unwrap();
        let root_entry = index.iter().find(|e| e.id == "root").unwrap();
        let other_entry = index.iter().find(|e| e.id == "other").unwrap();
        assert!(root_entry.admins.is_some());
        assert!(other_entry.admins.is_none());
    }

    #[tokio::test]
    async fn admin_show_attaches_draft_children_and_all_offers() {
        let admin = Uuid::new_v4();
        let root = svc("root", ServiceKind::Category, PublishStatus::Published, None, vec![admin]);
        let draft_child =
            svc("draft-child", ServiceKind::Service, PublishStatus::Draft, Some(root.id), vec![]);
        let leaf = svc("leaf", ServiceKind::Service, PublishStatus::Published, Some(root.id), vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([
            root.clone(),
            draft_child.clone(),
            leaf.clone(),
        ]));
        let p = provider_model("acme");
        repo.add_offer(offer_model(leaf.id, p.id, OfferStatus::Draft), p.clone());
        repo.add_offer(offer_model(leaf.id, p.id, OfferStatus::Public), p.clone());
        let catalog = CatalogService::new(repo);
        let u = viewer(admin);

        let root_view = catalog.show(Some(&u), "root").await.unwrap().unwrap();
        let children = root_view.children.unwrap();
        assert_eq!(children.len(), 2);

        let leaf_view = catalog.show(Some(&u), "leaf").await.unwrap().unwrap();
        // Admin of the root administers the leaf by inheritance: draft
        // offers included.
        assert_eq!(leaf_view.offers.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn public_show_filters_children_offers_and_admin_sets() {
        let root = svc("root", ServiceKind::Category, PublishStatus::Published, None, vec![Uuid::new_v4()]);
        let draft_child =
            svc("draft-child", ServiceKind::Category, PublishStatus::Draft, Some(root.id), vec![]);
        let leaf = svc("leaf", ServiceKind::Service, PublishStatus::Published, Some(root.id), vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([
            root.clone(),
            draft_child,
            leaf.clone(),
        ]));
        let p = provider_model("acme");
        repo.add_offer(offer_model(leaf.id, p.id, OfferStatus::Draft), p.clone());
        repo.add_offer(offer_model(leaf.id, p.id, OfferStatus::Public), p.clone());
        let catalog = CatalogService::new(repo);

        let root_view = catalog.show(None, "root").await.unwrap().unwrap();
        assert!(root_view.admins.is_none());
        let children = root_view.children.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "leaf");

        let leaf_view = catalog.show(None, "leaf").await.unwrap().unwrap();
        assert_eq!(leaf_view.offers.as_ref().unwrap().len(), 1);
        // The public projection strips admin sets from the chain too.
        assert!(leaf_view.parent.as_ref().unwrap().admins.is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_slug() {
        let existing = svc("taken", ServiceKind::Category, PublishStatus::Published, None, vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([existing]));
        let catalog = CatalogService::new(repo);
        let u = viewer(Uuid::new_v4());

        let err = catalog
            .create(
                &u,
                CreateService {
                    id: "taken".into(),
                    name: "Taken".into(),
                    description: None,
                    terms: None,
                    kind: ServiceKind::Category,
                    status: PublishStatus::Draft,
                    parent_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_under_foreign_parent_is_forbidden_and_drafts_stay_hidden() {
        let published =
            svc("pub-root", ServiceKind::Category, PublishStatus::Published, None, vec![Uuid::new_v4()]);
        let draft =
            svc("draft-root", ServiceKind::Category, PublishStatus::Draft, None, vec![Uuid::new_v4()]);
        let repo = Arc::new(MockCatalogRepository::with_services([published, draft]));
        let catalog = CatalogService::new(repo);
        let u = viewer(Uuid::new_v4());

        let input = |parent: &str| CreateService {
            id: "new-kid".into(),
            name: "New".into(),
            description: None,
            terms: None,
            kind: ServiceKind::Service,
            status: PublishStatus::Draft,
            parent_id: Some(parent.into()),
        };

        let err = catalog.create(&u, input("pub-root")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        // A hidden parent reads exactly like a missing one.
        let err = catalog.create(&u, input("draft-root")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "parent not found"));
        let err = catalog.create(&u, input("no-such")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "parent not found"));
    }

    #[tokio::test]
    async fn creator_becomes_admin_and_sees_the_new_service() {
        let repo = Arc::new(MockCatalogRepository::default());
        let catalog = CatalogService::new(repo.clone());
        let u = viewer(Uuid::new_v4());

        let view = catalog
            .create(
                &u,
                CreateService {
                    id: "Fresh".into(),
                    name: "Fresh".into(),
                    description: None,
                    terms: None,
                    kind: ServiceKind::Category,
                    status: PublishStatus::Draft,
                    parent_id: None,
                },
            )
            .await
            .unwrap();
        // Slug is normalized to lowercase; creator lands in the admin set.
        assert_eq!(view.id, "fresh");
        assert_eq!(view.admins.unwrap(), vec![u.id]);
        assert!(catalog.show(Some(&u), "fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn reparent_under_own_descendant_fails_and_leaves_parent_unchanged() {
        let admin = Uuid::new_v4();
        let root = svc("root", ServiceKind::Category, PublishStatus::Published, None, vec![admin]);
        let child = svc("child", ServiceKind::Category, PublishStatus::Published, Some(root.id), vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([root.clone(), child]));
        let catalog = CatalogService::new(repo.clone());
        let u = viewer(admin);

        let err = catalog
            .update(
                &u,
                "root",
                UpdateService { parent_id: Some(Some("child".into())), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "parent cycle"));
        assert_eq!(repo.get(root.id).unwrap().parent_id, None);
    }

    #[tokio::test]
    async fn reparent_requires_admin_of_the_new_chain() {
        let old_parent_admin = Uuid::new_v4();
        let old_parent =
            svc("old", ServiceKind::Category, PublishStatus::Published, None, vec![old_parent_admin]);
        let new_parent =
            svc("new", ServiceKind::Category, PublishStatus::Published, None, vec![Uuid::new_v4()]);
        let old_parent_id = old_parent.id;
        let moved =
            svc("moved", ServiceKind::Service, PublishStatus::Published, Some(old_parent.id), vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([
            old_parent,
            new_parent,
            moved.clone(),
        ]));
        let catalog = CatalogService::new(repo.clone());

        // Administers `moved` through the old parent only.
        let err = catalog
            .update(
                &viewer(old_parent_admin),
                "moved",
                UpdateService { parent_id: Some(Some("new".into())), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert_eq!(repo.get(moved.id).unwrap().parent_id, Some(old_parent_id));
    }

    #[tokio::test]
    async fn update_by_non_admin_hides_as_not_found() {
        let published =
            svc("shown", ServiceKind::Category, PublishStatus::Published, None, vec![Uuid::new_v4()]);
        let repo = Arc::new(MockCatalogRepository::with_services([published]));
        let catalog = CatalogService::new(repo);

        let err = catalog
            .update(&viewer(Uuid::new_v4()), "shown", UpdateService::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn reroot_with_explicit_null_parent() {
        let admin = Uuid::new_v4();
        let root = svc("root", ServiceKind::Category, PublishStatus::Published, None, vec![admin]);
        let child = svc("child", ServiceKind::Category, PublishStatus::Published, Some(root.id), vec![admin]);
        let repo = Arc::new(MockCatalogRepository::with_services([root, child.clone()]));
        let catalog = CatalogService::new(repo.clone());

        let patch: UpdateService = serde_json::from_str(r#"{"parentId": null}"#).unwrap();
        assert_eq!(patch.parent_id, Some(None));
        catalog.update(&viewer(admin), "child", patch).await.unwrap();
        assert_eq!(repo.get(child.id).unwrap().parent_id, None);

        // Absent parentId leaves the parent untouched.
        let patch: UpdateService = serde_json::from_str(r#"{"name": "Renamed"}"#).unwrap();
        assert_eq!(patch.parent_id, None);
    }

    #[tokio::test]
    async fn corrupted_parent_cycle_errors_on_show_and_drops_out_of_index() {
        let healthy =
            svc("healthy", ServiceKind::Category, PublishStatus::Published, None, vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([healthy]));
        let a = svc("a", ServiceKind::Category, PublishStatus::Published, None, vec![]);
        let b = svc("b", ServiceKind::Category, PublishStatus::Published, Some(a.id), vec![]);
        repo.add_service(a.clone());
        repo.add_service(b.clone());
        repo.set_parent_unchecked(a.id, Some(b.id));
        let catalog = CatalogService::new(repo);

        let err = catalog.show(None, "a").await.unwrap_err();
        assert!(matches!(err, ServiceError::Cycle));

        // The flattened listing stays usable; only the corrupted pair is gone.
        let entries = catalog.index(None, None).await.unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["healthy"]);
    }

    #[tokio::test]
    async fn explicit_null_clears_description_and_absence_keeps_it() {
        let admin = Uuid::new_v4();
        let mut node = svc("docs", ServiceKind::Category, PublishStatus::Published, None, vec![admin]);
        node.description = Some("about".into());
        node.terms = Some("terms".into());
        let repo = Arc::new(MockCatalogRepository::with_services([node.clone()]));
        let catalog = CatalogService::new(repo.clone());
        let u = viewer(admin);

        let patch: UpdateService = serde_json::from_str(r#"{"name": "Docs"}"#).unwrap();
        catalog.update(&u, "docs", patch).await.unwrap();
        let kept = repo.get(node.id).unwrap();
        assert_eq!(kept.description.as_deref(), Some("about"));
        assert_eq!(kept.terms.as_deref(), Some("terms"));

        let patch: UpdateService =
            serde_json::from_str(r#"{"description": null, "terms": null}"#).unwrap();
        catalog.update(&u, "docs", patch).await.unwrap();
        let cleared = repo.get(node.id).unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.terms, None);
    }

    #[tokio::test]
    async fn delete_blocked_by_children_or_offers() {
        let admin = Uuid::new_v4();
        let root = svc("root", ServiceKind::Category, PublishStatus::Published, None, vec![admin]);
        let leaf = svc("leaf", ServiceKind::Service, PublishStatus::Published, Some(root.id), vec![]);
        let repo = Arc::new(MockCatalogRepository::with_services([root.clone(), leaf.clone()]));
        let p = provider_model("acme");
        repo.add_offer(offer_model(leaf.id, p.id, OfferStatus::Public), p);
        let catalog = CatalogService::new(repo.clone());
        let u = viewer(admin);

        let err = catalog.delete(&u, "root").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        let err = catalog.delete(&u, "leaf").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(repo.get(root.id).is_some());
    }
}
