use thiserror::Error;

/// Business error taxonomy shared by the catalog, provider and offer
/// domains. The HTTP layer maps each variant to a status code; `Cycle`
/// and `Db` are store-level failures and surface as 500.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("cycle detected in service hierarchy")]
    Cycle,
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }

    pub fn forbidden(what: &str) -> Self {
        Self::Forbidden(what.to_string())
    }
}
