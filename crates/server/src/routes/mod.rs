use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::extract;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod auth;
pub mod offers;
pub mod providers;
pub mod services;
pub mod users;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn fallback() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "no such route"})))
}

/// Build the full application router. Every `/api` route passes through
/// the viewer middleware; authentication is optional there and each
/// handler decides what anonymous viewers may do.
pub fn build_router(cors: CorsLayer, state: AppState) -> Router {
    let api = Router::new()
        .route("/api/auth", post(auth::login).delete(auth::logout))
        .route("/api/users", post(users::register))
        .route("/api/users/verify-email", post(users::verify_email))
        .route(
            "/api/users/:id",
            get(users::show).put(users::update),
        )
        .route("/api/users/:id/change-password", post(users::change_password))
        .route("/api/services", get(services::index).post(services::create))
        .route(
            "/api/services/:id",
            get(services::show).put(services::update).delete(services::delete),
        )
        .route("/api/providers", get(providers::index).post(providers::create))
        .route(
            "/api/providers/:id",
            get(providers::show).put(providers::update).delete(providers::delete),
        )
        .route("/api/providers/:id/offers", post(providers::create_offer))
        .route(
            "/api/offers/:id",
            get(offers::show).put(offers::update).delete(offers::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), extract::attach_viewer));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(fallback)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // Span per request with method and path, at INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // Response log carries status and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
