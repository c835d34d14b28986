//! Viewer-dependent projections.
//!
//! The same document is rendered in exactly two shapes: an admin view that
//! carries the `admins` set, and a public view that strips it from the node
//! and everything nested under it. Which shape applies is decided once by
//! the resolver, never by ad-hoc field deletion at call sites.

use serde::Serialize;
use uuid::Uuid;

use models::offer::{self, OfferStatus};
use models::provider::{self, Ownership};
use models::service::{self, PublishStatus, ServiceKind};

#[derive(Debug, Clone, Serialize)]
pub struct ServiceView {
    /// The human-readable slug; internal keys never leave the API.
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    pub status: PublishStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admins: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<ServiceView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ServiceView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<Vec<OfferView>>,
}

impl ServiceView {
    /// Admin shape: includes the admin set. Relations are attached by the
    /// resolver.
    pub fn admin(model: &service::Model) -> Self {
        let mut view = Self::public(model);
        view.admins = Some(model.admins.clone());
        view
    }

    /// Public shape: no admin set, no relations.
    pub fn public(model: &service::Model) -> Self {
        Self {
            id: model.slug.clone(),
            name: model.name.clone(),
            description: model.description.clone(),
            terms: model.terms.clone(),
            kind: model.kind,
            status: model.status,
            admins: None,
            parent: None,
            children: None,
            offers: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceView {
    pub currency: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferView {
    pub id: Uuid,
    pub status: OfferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub landing: String,
    pub location: String,
    pub price: PriceView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Box<ServiceView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Box<ProviderView>>,
}

impl OfferView {
    pub fn from_model(model: &offer::Model) -> Self {
        Self {
            id: model.id,
            status: model.status,
            description: model.description.clone(),
            landing: model.landing.clone(),
            location: model.location.clone(),
            price: PriceView {
                currency: model.price_currency.clone(),
                amount: model.price_amount,
            },
            service: None,
            provider: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderView {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ownership: Ownership,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admins: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<Vec<OfferView>>,
}

impl ProviderView {
    pub fn admin(model: &provider::Model) -> Self {
        let mut view = Self::public(model);
        view.admins = Some(model.admins.clone());
        view
    }

    pub fn public(model: &provider::Model) -> Self {
        Self {
            id: model.slug.clone(),
            name: model.name.clone(),
            description: model.description.clone(),
            ownership: model.ownership,
            admins: None,
            offers: None,
        }
    }
}

/// Flat `index` entry: the direct parent is referenced by slug so clients
/// can rebuild the tree without nested payloads.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceIndexEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    pub status: PublishStatus,
    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admins: Option<Vec<Uuid>>,
}
