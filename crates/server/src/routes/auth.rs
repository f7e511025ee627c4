use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::guard::CurrentUser;
use service::auth::domain::{LoginInput, RegisterInput, Role};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: configs::AuthConfig,
}

impl ServerState {
    /// Auth service wired to the SeaORM repository. Constructed per
    /// request; the repository only clones the connection handle.
    pub fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        let repo = Arc::new(SeaOrmAuthRepository { db: self.db.clone() });
        AuthService::new(
            repo,
            AuthConfig {
                jwt_secret: Some(self.auth.jwt_secret.clone()),
                password_algorithm: "argon2".into(),
                require_email_confirmation: self.auth.require_email_confirmation,
                session_ttl_hours: self.auth.session_ttl_hours,
                reset_token_ttl_minutes: self.auth.reset_token_ttl_minutes,
                site_url: self.auth.site_url.clone(),
            },
        )
    }
}

pub(crate) fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new("auth_token", token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[derive(Serialize)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub role: Role,
}

#[derive(Serialize)]
pub struct SessionOutput {
    #[serde(flatten)]
    pub user: SessionUser,
    pub token: String,
}

#[derive(Serialize)]
pub struct MessageOutput {
    pub message: String,
}

fn session_user(user: service::auth::domain::AuthUser) -> SessionUser {
    SessionUser { user_id: user.id, email: user.email, full_name: user.full_name, role: user.role }
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request")))]
pub async fn register(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<RegisterInput>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let svc = state.auth_service();
    let registration = svc.register(input).await?;

    if let Some(session) = registration.session {
        let token = session
            .token
            .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token generation failed"))?;
        let jar = jar.add(session_cookie(token.clone()));
        let out = SessionOutput { user: session_user(session.user), token };
        return Ok((jar, Json(serde_json::to_value(out).unwrap_or_default())));
    }

    // Confirmation configured: no session until the signup link is redeemed.
    let out = MessageOutput { message: "Check your email to confirm your account".into() };
    Ok((jar, Json(serde_json::to_value(out).unwrap_or_default())))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<SessionOutput>), ApiError> {
    let svc = state.auth_service();
    let session = svc.login(input).await?;
    let token = session
        .token
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token generation failed"))?;
    let jar = jar.add(session_cookie(token.clone()));
    Ok((jar, Json(SessionOutput { user: session_user(session.user), token })))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::from("auth_token"));
    (jar, StatusCode::NO_CONTENT)
}

/// Current user. The JWT only carries id/email/role, so the display name
/// comes from the profile row.
pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<SessionUser>, ApiError> {
    let profile = models::profile::find_by_email(&state.db, &user.email)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
    Ok(Json(SessionUser {
        user_id: user.id,
        email: profile.email,
        full_name: profile.full_name,
        role: user.role,
    }))
}

#[derive(Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[utoipa::path(post, path = "/auth/forgot-password", tag = "auth", request_body = crate::openapi::ForgotPasswordRequest, responses((status = 200, description = "Acknowledged")))]
pub async fn forgot_password(
    State(state): State<ServerState>,
    Json(input): Json<ForgotPasswordInput>,
) -> Result<Json<MessageOutput>, ApiError> {
    let svc = state.auth_service();
    // Unknown emails are acknowledged the same way; no account probing.
    let _ = svc.request_password_reset(&input.email).await?;
    Ok(Json(MessageOutput { message: "Password reset email sent".into() }))
}

#[derive(Deserialize)]
pub struct ResetPasswordInput {
    pub token: String,
    pub password: String,
}

#[utoipa::path(post, path = "/auth/reset-password", tag = "auth", request_body = crate::openapi::ResetPasswordRequest, responses((status = 200, description = "Password updated"), (status = 400, description = "Link expired")))]
pub async fn reset_password(
    State(state): State<ServerState>,
    Json(input): Json<ResetPasswordInput>,
) -> Result<Json<MessageOutput>, ApiError> {
    let svc = state.auth_service();
    svc.complete_password_reset(&input.token, &input.password).await?;
    Ok(Json(MessageOutput { message: "Password updated".into() }))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Link-redemption callback: recovery links validate the token and land on
/// the reset form; signup links confirm the account and land on the
/// dashboard. Anything else falls back to the login page.
pub async fn callback(
    State(state): State<ServerState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let svc = state.auth_service();
    let kind = params.kind.as_deref();

    if let Some(code) = params.code.as_deref() {
        if kind == Some("recovery") {
            return match svc.validate_reset_token(code).await {
                Ok(()) => Redirect::to(&format!("/reset-password?token={code}")),
                Err(e) => {
                    tracing::warn!(error = %e, "recovery callback failed");
                    Redirect::to(&format!(
                        "/reset-password?error=access_denied&error_description={}",
                        urlencode(&e.to_string())
                    ))
                }
            };
        }

        match svc.verify_email(code).await {
            Ok(_) => return Redirect::to("/dashboard"),
            Err(e) => {
                tracing::warn!(error = %e, "signup callback failed");
            }
        }
    }

    Redirect::to("/login")
}

/// Minimal percent-encoding for the error_description query value.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::urlencode;

    #[test]
    fn urlencode_escapes_reserved_chars() {
        assert_eq!(urlencode("link expired"), "link%20expired");
        assert_eq!(urlencode("a&b=c"), "a%26b%3Dc");
        assert_eq!(urlencode("safe-chars_.~"), "safe-chars_.~");
    }
}
