use std::sync::Arc;

use sea_orm::DatabaseConnection;

use service::auth::service::AuthConfig;
use service::mail::Mailer;
use service::viewer::GlobalAdmins;

/// Shared application state. Repositories are built per request from the
/// connection pool; only configuration and the mailer live here.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub auth: AuthConfig,
    pub global_admins: Arc<GlobalAdmins>,
    pub mailer: Arc<dyn Mailer>,
}
