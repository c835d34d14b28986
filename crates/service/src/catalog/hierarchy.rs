//! Ancestor resolution and the pure authorization/publication predicates.
//!
//! Resolution is the single async phase: it walks `parent_id` references
//! one store lookup per level and materializes the chain as an ordered
//! sequence. Everything downstream (`is_administered_by`, `is_published`,
//! `has_ancestor`) is synchronous and pure over that sequence. Never a
//! cyclic in-memory graph.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use models::service::{self, PublishStatus};

use super::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::viewer::Viewer;

/// Acyclicity is enforced on write, so any chain longer than this is
/// corrupted data; the walk refuses to follow it further.
pub const MAX_ANCESTOR_DEPTH: usize = 32;

/// A service with its full ancestor chain attached, immediate parent
/// first, root last.
#[derive(Debug, Clone)]
pub struct ResolvedService {
    pub node: service::Model,
    pub ancestors: Vec<service::Model>,
}

/// Walks `parent_id` upward until a root is reached. Fails with `Cycle`
/// if the walk revisits a node or exceeds [`MAX_ANCESTOR_DEPTH`], and
/// with a store error if a parent reference dangles.
pub async fn resolve_ancestors<R: CatalogRepository + ?Sized>(
    repo: &R,
    node: service::Model,
) -> Result<ResolvedService, ServiceError> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    seen.insert(node.id);
    let mut ancestors = Vec::new();
    let mut cursor = node.parent_id;
    while let Some(parent_id) = cursor {
        if !seen.insert(parent_id) || ancestors.len() >= MAX_ANCESTOR_DEPTH {
            return Err(ServiceError::Cycle);
        }
        let parent = repo
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| ServiceError::Db(format!("dangling parent reference {parent_id}")))?;
        cursor = parent.parent_id;
        ancestors.push(parent);
    }
    Ok(ResolvedService { node, ancestors })
}

/// Chain resolution against an already-loaded id map. Used by `index`,
/// which fetches the whole forest in one query.
pub fn resolve_from_map(
    node: service::Model,
    by_id: &HashMap<Uuid, service::Model>,
) -> Result<ResolvedService, ServiceError> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    seen.insert(node.id);
    let mut ancestors = Vec::new();
    let mut cursor = node.parent_id;
    while let Some(parent_id) = cursor {
        if !seen.insert(parent_id) || ancestors.len() >= MAX_ANCESTOR_DEPTH {
            return Err(ServiceError::Cycle);
        }
        let parent = by_id
            .get(&parent_id)
            .ok_or_else(|| ServiceError::Db(format!("dangling parent reference {parent_id}")))?;
        cursor = parent.parent_id;
        ancestors.push(parent.clone());
    }
    Ok(ResolvedService { node, ancestors })
}

impl ResolvedService {
    /// True iff the viewer is a global admin, is listed on this node, or
    /// administers any ancestor. Rights flow downward only: a
    /// descendant's admin list grants nothing on its ancestors.
    pub fn is_administered_by(&self, viewer: Option<&Viewer>) -> bool {
        let Some(viewer) = viewer else { return false };
        if viewer.global_admin {
            return true;
        }
        self.chain().any(|svc| svc.admins.contains(&viewer.id))
    }

    /// Publication is conjunctive over the full chain: this node and
    /// every ancestor must be published.
    pub fn is_published(&self) -> bool {
        self.chain().all(|svc| svc.status == PublishStatus::Published)
    }

    pub fn has_ancestor(&self, id: Uuid) -> bool {
        self.ancestors.iter().any(|a| a.id == id)
    }

    /// Root-relative depth: 0 for roots.
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// The viewer-relationship for a specific ancestor (used when
    /// rendering the parent chain: each ancestor's own chain is its
    /// suffix of this one).
    pub fn administers_ancestor(&self, index: usize, viewer: Option<&Viewer>) -> bool {
        let Some(viewer) = viewer else { return false };
        if viewer.global_admin {
            return true;
        }
        self.ancestors[index..]
            .iter()
            .any(|svc| svc.admins.contains(&viewer.id))
    }

    fn chain(&self) -> impl Iterator<Item = &service::Model> {
        std::iter::once(&self.node).chain(self.ancestors.iter())
    }
}
