use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub email: String, pub full_name: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ForgotPasswordRequest { pub email: String }

#[derive(ToSchema)]
pub struct ResetPasswordRequest { pub token: String, pub password: String }

#[derive(ToSchema)]
pub struct AdminSetupRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct SweetRequest {
    pub name: String,
    pub description: String,
    /// Decimal carried as a string, e.g. "4.50".
    pub price: String,
    pub category: String,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
}

#[derive(ToSchema)]
pub struct PurchaseRequest { pub quantity: Option<i32> }

#[derive(ToSchema)]
pub struct RestockRequest { pub quantity: i32 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::forgot_password,
        crate::routes::auth::reset_password,
        crate::routes::admin::setup,
        crate::routes::admin::login,
        crate::routes::sweets::list,
        crate::routes::sweets::get_one,
        crate::routes::sweets::create,
        crate::routes::sweets::update,
        crate::routes::sweets::remove,
        crate::routes::sweets::purchase,
        crate::routes::sweets::restock,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            AdminSetupRequest,
            SweetRequest,
            PurchaseRequest,
            RestockRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "admin"),
        (name = "sweets"),
    )
)]
pub struct ApiDoc;
