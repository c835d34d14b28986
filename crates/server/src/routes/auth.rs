use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

use service::auth::domain::{AuthUser, LoginInput};
use service::auth::errors::AuthError;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::AuthService;

use crate::errors::ApiError;
use crate::state::AppState;

pub fn auth_service(state: &AppState) -> AuthService<SeaOrmAuthRepository> {
    AuthService::new(
        Arc::new(SeaOrmAuthRepository { db: state.db.clone() }),
        state.mailer.clone(),
        state.auth.clone(),
    )
}

#[derive(Serialize)]
pub struct SessionOutput {
    pub user: AuthUser,
    pub token: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new("auth_token", token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// All login failures share the 401 status; the body carries a short
/// reason so the client can phrase its message without the status code
/// disclosing which accounts exist.
#[utoipa::path(post, path = "/api/auth", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<SessionOutput>), ApiError> {
    let session = auth_service(&state).login(input).await.map_err(|e| match e {
        AuthError::NotFound
        | AuthError::Unverified
        | AuthError::Throttled
        | AuthError::Unauthorized => ApiError::new(StatusCode::UNAUTHORIZED, e.reason()),
        other => ApiError::from(other),
    })?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((jar, Json(SessionOutput { user: session.user, token: session.token })))
}

#[utoipa::path(delete, path = "/api/auth", tag = "auth", responses((status = 204, description = "Logged out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::from("auth_token"));
    (jar, StatusCode::NO_CONTENT)
}
