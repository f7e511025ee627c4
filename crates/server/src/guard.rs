//! Session and role guards applied uniformly to protected routes.
//!
//! `require_session` authenticates the request (Authorization bearer or
//! `auth_token` cookie) and injects a [`CurrentUser`]; `require_role`
//! layers on top of it for admin-only surfaces.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::routes::auth::ServerState;
use service::auth::domain::Role;

/// Authenticated caller, available to handlers via `Extension<CurrentUser>`
/// behind `require_session`.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    uid: String,
    role: String,
    exp: usize,
}

fn token_from_request(req: &Request) -> Option<String> {
    if let Some(h) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        return h.strip_prefix("Bearer ").map(|t| t.to_string());
    }

    // Cookie fallback: browsers carry the session as auth_token.
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    for part in cookie_header.split(';') {
        if let Some(rest) = part.trim().strip_prefix("auth_token=") {
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}

pub fn decode_session(secret: &str, token: &str) -> Result<CurrentUser, ApiError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| {
            tracing::warn!(err = %e, "token validation failed");
            ApiError::unauthorized("Unauthorized")
        })?;
    let id = Uuid::parse_str(&data.claims.uid)
        .map_err(|_| ApiError::unauthorized("Unauthorized"))?;
    let role = Role::parse(&data.claims.role)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
    Ok(CurrentUser { id, email: data.claims.sub, role })
}

/// Authenticate the request and stash the caller in request extensions.
pub async fn require_session(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = token_from_request(&req)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
    let user = decode_session(&state.auth.jwt_secret, &token)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Reusable role guard; layered after `require_session`.
pub async fn require_role(required: Role, req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
    if required == Role::Admin && user.role != Role::Admin {
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        uid: String,
        role: String,
        exp: usize,
    }

    fn make_token(secret: &str, role: &str, exp_offset_secs: i64) -> String {
        let claims = TestClaims {
            sub: "t@example.com".into(),
            uid: Uuid::new_v4().to_string(),
            role: role.into(),
            exp: (chrono::Utc::now().timestamp() + exp_offset_secs) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn decode_roundtrip() {
        let token = make_token("secret", "admin", 3600);
        let user = decode_session("secret", &token).unwrap();
        assert_eq!(user.email, "t@example.com");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn expired_token_rejected() {
        let token = make_token("secret", "user", -3600);
        assert!(decode_session("secret", &token).is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = make_token("secret", "user", 3600);
        assert!(decode_session("other", &token).is_err());
    }

    #[test]
    fn unknown_role_rejected() {
        let token = make_token("secret", "owner", 3600);
        assert!(decode_session("secret", &token).is_err());
    }
}
