use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use service::catalog::repo::seaorm::SeaOrmCatalogRepository;
use service::catalog::service::{CreateService, UpdateService};
use service::catalog::CatalogService;
use service::view::{ServiceIndexEntry, ServiceView};

use crate::errors::ApiError;
use crate::extract::CurrentViewer;
use crate::state::AppState;

fn catalog(state: &AppState) -> CatalogService<SeaOrmCatalogRepository> {
    CatalogService::new(Arc::new(SeaOrmCatalogRepository { db: state.db.clone() }))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct IndexQuery {
    /// Maximum tree depth to include; roots are level 0.
    pub level: Option<usize>,
}

#[utoipa::path(get, path = "/api/services", tag = "services", params(IndexQuery), responses((status = 200, description = "OK")))]
pub async fn index(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Query(query): Query<IndexQuery>,
) -> Result<Json<Vec<ServiceIndexEntry>>, ApiError> {
    let entries = catalog(&state).index(viewer.0.as_ref(), query.level).await?;
    Ok(Json(entries))
}

#[utoipa::path(get, path = "/api/services/{id}", tag = "services", responses((status = 200, description = "OK"), (status = 404, description = "Not visible")))]
pub async fn show(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<String>,
) -> Result<Json<ServiceView>, ApiError> {
    match catalog(&state).show(viewer.0.as_ref(), &id).await? {
        Some(view) => Ok(Json(view)),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "service not found")),
    }
}

#[utoipa::path(post, path = "/api/services", tag = "services", request_body = crate::openapi::CreateServiceRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn create(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Json(input): Json<CreateService>,
) -> Result<(StatusCode, Json<ServiceView>), ApiError> {
    let viewer = viewer.require()?;
    let view = catalog(&state).create(viewer, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(put, path = "/api/services/{id}", tag = "services", request_body = crate::openapi::UpdateServiceRequest, responses((status = 204, description = "Updated"), (status = 404, description = "Not visible")))]
pub async fn update(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<String>,
    Json(patch): Json<UpdateService>,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer.require()?;
    catalog(&state).update(viewer, &id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/api/services/{id}", tag = "services", responses((status = 204, description = "Deleted"), (status = 404, description = "Not visible"), (status = 409, description = "Still referenced")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer.require()?;
    catalog(&state).delete(viewer, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
