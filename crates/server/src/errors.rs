use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// HTTP-facing error: a status and a short message rendered as
/// `{"error": "..."}`. Internal failures are logged and collapsed to an
/// opaque 500 so storage details never leak to clients.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "authentication required")
    }

    fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ServiceError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            ServiceError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            ServiceError::Model(ModelError::Validation(msg)) => {
                Self::new(StatusCode::BAD_REQUEST, msg)
            }
            ServiceError::Model(ModelError::Db(e)) => Self::internal(e),
            ServiceError::Cycle => Self::internal("cycle detected in service hierarchy"),
            ServiceError::Db(e) => Self::internal(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, err.to_string()),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            AuthError::Unverified => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            AuthError::Throttled => Self::new(StatusCode::TOO_MANY_REQUESTS, err.to_string()),
            AuthError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, err.to_string()),
            AuthError::HashError(e) => Self::internal(e),
            AuthError::TokenError(e) => Self::internal(e),
            AuthError::Repository(e) => Self::internal(e),
            AuthError::Mail(e) => Self::internal(e),
        }
    }
}
