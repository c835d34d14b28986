use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use service::auth::domain::{AuthUser, ChangePassword, RegisterInput, UpdateAccount};

use super::auth::auth_service;
use crate::errors::ApiError;
use crate::extract::CurrentViewer;
use crate::state::AppState;

#[utoipa::path(post, path = "/api/users", tag = "users", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthUser>), ApiError> {
    let user = auth_service(&state).register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Accounts are private: only the owner (or a global admin) may read
/// one, and only the owner may change it.
#[utoipa::path(get, path = "/api/users/{id}", tag = "users", responses((status = 200, description = "OK"), (status = 403, description = "Forbidden")))]
pub async fn show(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuthUser>, ApiError> {
    let viewer = viewer.require()?;
    if viewer.id != id && !viewer.global_admin {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "not your account"));
    }
    let user = auth_service(&state).account(id).await?;
    Ok(Json(user))
}

#[utoipa::path(put, path = "/api/users/{id}", tag = "users", request_body = crate::openapi::UpdateAccountRequest, responses((status = 204, description = "Updated"), (status = 403, description = "Forbidden"), (status = 409, description = "Conflict")))]
pub async fn update(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateAccount>,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer.require()?;
    if viewer.id != id {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "not your account"));
    }
    auth_service(&state).update_account(id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/users/{id}/change-password", tag = "users", request_body = crate::openapi::ChangePasswordRequest, responses((status = 204, description = "Changed"), (status = 401, description = "Unauthorized"), (status = 403, description = "Forbidden")))]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<Uuid>,
    Json(input): Json<ChangePassword>,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer.require()?;
    if viewer.id != id {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "not your account"));
    }
    auth_service(&state).change_password(id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct VerifyEmailInput {
    pub key: String,
}

#[utoipa::path(post, path = "/api/users/verify-email", tag = "users", request_body = crate::openapi::VerifyEmailRequest, responses((status = 204, description = "Verified"), (status = 404, description = "Unknown key")))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(input): Json<VerifyEmailInput>,
) -> Result<StatusCode, ApiError> {
    auth_service(&state).verify_email(&input.key).await?;
    Ok(StatusCode::NO_CONTENT)
}
