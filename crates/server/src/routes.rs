use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::auth::domain::Role;

use crate::guard;
use crate::openapi::ApiDoc;

pub mod admin;
pub mod auth;
pub mod sweets;

pub use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service healthy")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public storefront and auth routes,
/// session-gated purchase, and admin-gated product management.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    // Public routes: catalog listing, health, and the whole auth surface.
    let public = Router::new()
        .route("/health", get(health))
        .route("/sweets", get(sweets::list))
        .route("/sweets/:id", get(sweets::get_one))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/callback", get(auth::callback))
        .route("/admin/setup", post(admin::setup))
        .route("/admin/login", post(admin::login));

    // Any authenticated account may purchase.
    let session_routes = Router::new()
        .route("/sweets/:id/purchase", post(sweets::purchase))
        .route("/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard::require_session));

    // Product mutations require the admin role on top of a session.
    let admin_routes = Router::new()
        .route("/sweets", post(sweets::create))
        .route("/sweets/:id", put(sweets::update).delete(sweets::remove))
        .route("/sweets/:id/restock", post(sweets::restock))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            guard::require_role(Role::Admin, req, next)
        }))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard::require_session));

    public
        .merge(session_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
