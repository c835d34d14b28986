use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};
use sea_orm::EntityTrait;
use tracing::debug;
use uuid::Uuid;

use service::auth::domain::Claims;
use service::viewer::Viewer;

use crate::state::AppState;

/// The viewer attached to every request, if any. Handlers that accept
/// anonymous access read the inner `Option` directly; the rest go
/// through [`CurrentViewer::require`].
#[derive(Clone)]
pub struct CurrentViewer(pub Option<Viewer>);

impl CurrentViewer {
    pub fn require(&self) -> Result<&Viewer, crate::errors::ApiError> {
        self.0.as_ref().ok_or_else(crate::errors::ApiError::unauthorized)
    }
}

/// Resolves the bearer token or `auth_token` cookie into a [`Viewer`].
/// A missing or invalid token degrades to anonymous rather than failing
/// the request; write handlers enforce authentication themselves.
pub async fn attach_viewer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .or_else(|| jar.get("auth_token").map(|c| c.value().to_string()));

    let viewer = match token {
        Some(token) => resolve_viewer(&state, &token).await,
        None => None,
    };

    let mut req = req;
    req.extensions_mut().insert(CurrentViewer(viewer));
    next.run(req).await
}

async fn resolve_viewer(state: &AppState, token: &str) -> Option<Viewer> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| debug!(error = %e, "rejected token"))
    .ok()?
    .claims;
    let uid: Uuid = claims.uid.parse().ok()?;

    // The user behind the token may have been deleted since issuance.
    let user = models::user::Entity::find_by_id(uid)
        .one(&state.db)
        .await
        .map_err(|e| debug!(error = %e, "viewer lookup failed"))
        .ok()??;
    Some(Viewer::new(user.id, user.username, &state.global_admins))
}
