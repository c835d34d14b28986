use std::sync::Arc;
use std::{env, net::SocketAddr};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use tower_http::cors::CorsLayer;
use tracing::info;

use service::mail::{HttpMailer, Mailer, NoopMailer};
use service::viewer::GlobalAdmins;

use crate::routes;
use crate::state::AppState;

fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr() -> anyhow::Result<SocketAddr> {
    let (host, port) = match configs::load_default() {
        Ok(cfg) => {
            let s = cfg.server;
            (s.host, s.port)
        }
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

pub fn build_state(db: sea_orm::DatabaseConnection) -> anyhow::Result<AppState> {
    let cfg = configs::AppConfig::load_and_validate()?;

    // Without a configured endpoint, verification mails land in the log only.
    let mailer: Arc<dyn Mailer> = if cfg.mail.endpoint.is_empty() {
        tracing::warn!("no mail endpoint configured; verification mails will only be logged");
        Arc::new(NoopMailer)
    } else {
        Arc::new(HttpMailer::new(cfg.mail.endpoint.clone(), cfg.mail.api_key.clone(), cfg.mail.from.clone()))
    };

    Ok(AppState {
        db,
        auth: service::auth::service::AuthConfig {
            jwt_secret: cfg.auth.jwt_secret.clone(),
            token_ttl_hours: cfg.auth.token_ttl_hours,
            verify_base_url: cfg.mail.verify_base_url.clone(),
        },
        global_admins: Arc::new(GlobalAdmins::new(&cfg.auth.global_admins)),
        mailer,
    })
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let db = models::db::connect().await?;
    Migrator::up(&db, None).await?;

    let state = build_state(db)?;
    let app: Router = routes::build_router(build_cors(), state);

    let addr = load_bind_addr()?;
    info!(%addr, "starting marketplace server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
