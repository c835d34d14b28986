use thiserror::Error;

/// Business errors for account workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("user already exists")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("email not verified")]
    Unverified,
    #[error("too many failed attempts")]
    Throttled,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
    #[error("mail delivery failed: {0}")]
    Mail(String),
}

impl AuthError {
    /// Short machine-readable reason carried in login failure bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NotFound => "user",
            AuthError::Unverified => "unverified",
            AuthError::Throttled => "brute",
            AuthError::Unauthorized => "password",
            _ => "error",
        }
    }
}
