use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// A Provider's priced listing against one leaf Service.
///
/// Offers are looked up by their generated id; a human-readable slug adds
/// no value here. Services and Providers never embed their offer sets --
/// the collections could be arbitrarily large.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "offer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub status: OfferStatus,
    pub description: Option<String>,
    pub landing: String,
    pub location: String,
    pub price_currency: String,
    pub price_amount: f64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "draft")]
    Draft,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Service,
    Provider,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Service => Entity::belongs_to(crate::service::Entity)
                .from(Column::ServiceId)
                .to(crate::service::Column::Id)
                .into(),
            Relation::Provider => Entity::belongs_to(crate::provider::Entity)
                .from(Column::ProviderId)
                .to(crate::provider::Column::Id)
                .into(),
        }
    }
}

impl Related<crate::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl Related<crate::provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Currency codes are not checked against a list; clients deal with odd
/// codes gracefully. Amounts must not be negative.
pub fn validate_price(currency: &str, amount: f64) -> Result<(), ModelError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ModelError::Validation("price.currency must be a 3-letter code".into()));
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(ModelError::Validation("price.amount must be >= 0".into()));
    }
    Ok(())
}

pub fn validate_landing(landing: &str) -> Result<(), ModelError> {
    if !(landing.starts_with("http://") || landing.starts_with("https://")) {
        return Err(ModelError::Validation("landing must be an http(s) URL".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_validation() {
        assert!(validate_price("CAD", 1500.0).is_ok());
        assert!(validate_price("CAD", -1.0).is_err());
        assert!(validate_price("cad", 10.0).is_err());
        assert!(validate_price("DOLLARS", 10.0).is_err());
    }

    #[test]
    fn landing_must_be_url() {
        assert!(validate_landing("https://example.com/offer").is_ok());
        assert!(validate_landing("example.com").is_err());
    }
}
