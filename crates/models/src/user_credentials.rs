use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Credential material for a user. Never serialized outward; the service
/// layer copies the fields it needs into its own domain types.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
    /// Present until the address is verified, then cleared.
    pub email_verification_key: Option<String>,
    /// Decays linearly over time; incremented on failed password attempts.
    pub brute_force_value: f64,
    pub brute_force_updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(crate::user::Entity)
                .from(Column::UserId)
                .to(crate::user::Column::Id)
                .into(),
        }
    }
}

impl Related<crate::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
