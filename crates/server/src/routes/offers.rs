use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use service::offer::service::UpdateOffer;
use service::view::OfferView;

use super::providers::offer_service;
use crate::errors::ApiError;
use crate::extract::CurrentViewer;
use crate::state::AppState;

#[utoipa::path(get, path = "/api/offers/{id}", tag = "offers", responses((status = 200, description = "OK"), (status = 404, description = "Not visible")))]
pub async fn show(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferView>, ApiError> {
    match offer_service(&state).show(viewer.0.as_ref(), id).await? {
        Some(view) => Ok(Json(view)),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "offer not found")),
    }
}

#[utoipa::path(put, path = "/api/offers/{id}", tag = "offers", request_body = crate::openapi::UpdateOfferRequest, responses((status = 204, description = "Updated"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateOffer>,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer.require()?;
    offer_service(&state).update(viewer, id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/api/offers/{id}", tag = "offers", responses((status = 204, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer.require()?;
    offer_service(&state).delete(viewer, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
