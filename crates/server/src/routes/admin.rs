use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::errors::ApiError;
use crate::routes::auth::{ServerState, SessionOutput, SessionUser};
use service::auth::domain::LoginInput;

#[derive(Deserialize)]
pub struct SetupInput {
    pub email: String,
    pub password: String,
}

/// One-time admin bootstrap. Fails once any admin profile exists.
#[utoipa::path(post, path = "/admin/setup", tag = "admin", request_body = crate::openapi::AdminSetupRequest, responses((status = 200, description = "Admin created"), (status = 400, description = "Admin already exists")))]
pub async fn setup(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<SetupInput>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    let svc = state.auth_service();
    let registration = svc.bootstrap_admin(&input.email, &input.password).await?;

    let session = registration
        .session
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token generation failed"))?;
    let token = session
        .token
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token generation failed"))?;

    let jar = jar.add(super::auth::session_cookie(token));
    Ok((jar, Json(serde_json::json!({
        "success": true,
        "message": "Admin account created and logged in successfully"
    }))))
}

/// Login for the admin panel: valid credentials with role=user are 403.
#[utoipa::path(post, path = "/admin/login", tag = "admin", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 403, description = "Admin access required")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<SessionOutput>), ApiError> {
    let svc = state.auth_service();
    let session = svc.login_admin(input).await?;
    let token = session
        .token
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token generation failed"))?;
    let jar = jar.add(super::auth::session_cookie(token.clone()));
    let user = session.user;
    Ok((jar, Json(SessionOutput {
        user: SessionUser {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
        },
        token,
    })))
}
