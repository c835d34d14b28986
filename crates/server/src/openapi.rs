use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    /// Username (case-insensitive) or email address.
    pub identifier: String,
    pub password: String,
}

#[derive(ToSchema)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(ToSchema, serde::Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

#[derive(ToSchema)]
pub struct VerifyEmailRequest {
    pub key: String,
}

#[derive(ToSchema, serde::Deserialize)]
pub struct CreateServiceRequest {
    /// Human-readable identifier, unique across all services.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub terms: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
}

#[derive(ToSchema, serde::Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub terms: Option<String>,
    pub status: Option<String>,
    /// Explicit null re-roots the service; omission leaves it in place.
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateProviderRequest {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub ownership: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateProviderRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ownership: Option<String>,
}

#[derive(ToSchema, serde::Deserialize)]
pub struct PriceDoc {
    pub currency: String,
    pub amount: f64,
}

#[derive(ToSchema, serde::Deserialize)]
pub struct CreateOfferRequest {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    pub status: String,
    pub description: Option<String>,
    pub landing: String,
    pub location: String,
    pub price: PriceDoc,
}

#[derive(ToSchema, serde::Deserialize)]
pub struct UpdateOfferRequest {
    pub status: Option<String>,
    pub description: Option<String>,
    pub landing: Option<String>,
    pub location: Option<String>,
    pub price: Option<PriceDoc>,
    #[serde(rename = "serviceId")]
    pub service_id: Option<String>,
    #[serde(rename = "providerId")]
    pub provider_id: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::users::register,
        crate::routes::users::show,
        crate::routes::users::update,
        crate::routes::users::change_password,
        crate::routes::users::verify_email,
        crate::routes::services::index,
        crate::routes::services::show,
        crate::routes::services::create,
        crate::routes::services::update,
        crate::routes::services::delete,
        crate::routes::providers::index,
        crate::routes::providers::show,
        crate::routes::providers::create,
        crate::routes::providers::update,
        crate::routes::providers::delete,
        crate::routes::providers::create_offer,
        crate::routes::offers::show,
        crate::routes::offers::update,
        crate::routes::offers::delete,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            UpdateAccountRequest,
            ChangePasswordRequest,
            VerifyEmailRequest,
            CreateServiceRequest,
            UpdateServiceRequest,
            CreateProviderRequest,
            UpdateProviderRequest,
            PriceDoc,
            CreateOfferRequest,
            UpdateOfferRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "services"),
        (name = "providers"),
        (name = "offers")
    )
)]
pub struct ApiDoc;
