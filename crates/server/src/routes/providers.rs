use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use service::catalog::repo::seaorm::SeaOrmCatalogRepository;
use service::offer::repo::seaorm::SeaOrmOfferRepository;
use service::offer::service::CreateOffer;
use service::offer::OfferService;
use service::provider::repo::seaorm::SeaOrmProviderRepository;
use service::provider::service::{CreateProvider, UpdateProvider};
use service::provider::ProviderService;
use service::view::{OfferView, ProviderView};

use crate::errors::ApiError;
use crate::extract::CurrentViewer;
use crate::state::AppState;

fn providers(state: &AppState) -> ProviderService<SeaOrmProviderRepository, SeaOrmCatalogRepository> {
    ProviderService::new(
        Arc::new(SeaOrmProviderRepository { db: state.db.clone() }),
        Arc::new(SeaOrmCatalogRepository { db: state.db.clone() }),
    )
}

pub fn offer_service(
    state: &AppState,
) -> OfferService<SeaOrmOfferRepository, SeaOrmCatalogRepository, SeaOrmProviderRepository> {
    OfferService::new(
        Arc::new(SeaOrmOfferRepository { db: state.db.clone() }),
        Arc::new(SeaOrmCatalogRepository { db: state.db.clone() }),
        Arc::new(SeaOrmProviderRepository { db: state.db.clone() }),
    )
}

#[utoipa::path(get, path = "/api/providers", tag = "providers", responses((status = 200, description = "OK")))]
pub async fn index(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
) -> Result<Json<Vec<ProviderView>>, ApiError> {
    let views = providers(&state).index(viewer.0.as_ref()).await?;
    Ok(Json(views))
}

#[utoipa::path(get, path = "/api/providers/{id}", tag = "providers", responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn show(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<String>,
) -> Result<Json<ProviderView>, ApiError> {
    match providers(&state).show(viewer.0.as_ref(), &id).await? {
        Some(view) => Ok(Json(view)),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "provider not found")),
    }
}

#[utoipa::path(post, path = "/api/providers", tag = "providers", request_body = crate::openapi::CreateProviderRequest, responses((status = 201, description = "Created"), (status = 409, description = "Conflict")))]
pub async fn create(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Json(input): Json<CreateProvider>,
) -> Result<(StatusCode, Json<ProviderView>), ApiError> {
    let viewer = viewer.require()?;
    let view = providers(&state).create(viewer, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(put, path = "/api/providers/{id}", tag = "providers", request_body = crate::openapi::UpdateProviderRequest, responses((status = 204, description = "Updated"), (status = 403, description = "Forbidden")))]
pub async fn update(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<String>,
    Json(patch): Json<UpdateProvider>,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer.require()?;
    providers(&state).update(viewer, &id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/api/providers/{id}", tag = "providers", responses((status = 204, description = "Deleted"), (status = 403, description = "Forbidden")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer.require()?;
    providers(&state).delete(viewer, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/providers/{id}/offers", tag = "offers", request_body = crate::openapi::CreateOfferRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden")))]
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<String>,
    Json(input): Json<CreateOffer>,
) -> Result<(StatusCode, Json<OfferView>), ApiError> {
    let viewer = viewer.require()?;
    let view = offer_service(&state).create_for_provider(viewer, &id, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}
