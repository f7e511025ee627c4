use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use jsonwebtoken::{encode, EncodingKey, Header as JwtHeader};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument};

use super::domain::{AuthSession, AuthUser, LoginInput, RegisterInput, Registration, Role, TokenPurpose};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
    pub require_email_confirmation: bool,
    pub session_ttl_hours: i64,
    pub reset_token_ttl_minutes: i64,
    pub site_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            password_algorithm: "argon2".into(),
            require_email_confirmation: false,
            session_ttl_hours: 12,
            reset_token_ttl_minutes: 60,
            site_url: "http://localhost:3000".into(),
        }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

#[derive(serde::Serialize)]
struct Claims {
    sub: String,
    uid: String,
    role: String,
    exp: usize,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new account with a hashed password.
    ///
    /// Role defaults to `user`. When email confirmation is required the
    /// account starts unconfirmed and a signup token is returned instead
    /// of a session.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::default());
    /// let input = RegisterInput { email: "user@example.com".into(), full_name: "Test".into(), password: "Secret123".into() };
    /// let reg = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(reg.user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<Registration, AuthError> {
        self.register_with_role(input, Role::User).await
    }

    /// Bootstrap the first admin account. Rejected once any admin exists.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<Registration, AuthError> {
        if self.repo.admin_exists().await? {
            return Err(AuthError::Conflict("Admin already exists".into()));
        }
        // No display name on the setup form; derive one from the mailbox.
        let full_name = email.split('@').next().unwrap_or(email).to_string();
        let input = RegisterInput { email: email.to_string(), full_name, password: password.to_string() };
        self.register_as_admin(input).await
    }

    async fn register_as_admin(&self, input: RegisterInput) -> Result<Registration, AuthError> {
        self.register_with_role(input, Role::Admin).await
    }

    async fn register_with_role(&self, input: RegisterInput, role: Role) -> Result<Registration, AuthError> {
        models::profile::validate_email(&input.email)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        models::profile::validate_full_name(&input.full_name)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict("User already exists".into()));
        }

        // Admin bootstrap is always immediately usable; regular signups wait
        // for confirmation when it is configured.
        let confirmed = role == Role::Admin || !self.cfg.require_email_confirmation;
        let user = self.repo.create_user(&input.email, &input.full_name, role, confirmed).await?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        let _cred = self
            .repo
            .upsert_password(user.id, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user_registered");

        if confirmed {
            let token = self.issue_jwt(&user)?;
            let session = AuthSession { user: user.clone(), token };
            return Ok(Registration { user, session: Some(session), verification_token: None });
        }

        let verification_token = self
            .repo
            .issue_token(user.id, TokenPurpose::Signup, self.cfg.reset_token_ttl_minutes)
            .await?;
        // Email delivery is an external concern; surface the link in logs.
        info!(
            user_id = %user.id,
            link = %format!("{}/auth/callback?code={}&type=signup", self.cfg.site_url, verification_token),
            "verification_link_issued"
        );
        Ok(Registration { user, session: None, verification_token: Some(verification_token) })
    }

    /// Authenticate an account and issue a session token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let cfg = AuthConfig { jwt_secret: Some("secret".into()), ..AuthConfig::default() };
    /// let svc = AuthService::new(repo, cfg);
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), full_name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self
            .repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self
            .repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        if self.cfg.require_email_confirmation && !user.email_confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        let token = self.issue_jwt(&user)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Login restricted to the admin surface: any valid account may present
    /// credentials, but only role=admin gets a session.
    pub async fn login_admin(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let session = self.login(input).await?;
        if session.user.role != Role::Admin {
            return Err(AuthError::Forbidden);
        }
        Ok(session)
    }

    /// First phase of the password reset: issue a recovery token.
    ///
    /// Unknown emails are acknowledged without a token so the endpoint
    /// cannot be used to probe for accounts.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.repo.find_user_by_email(email).await? else {
            debug!("reset requested for unknown email");
            return Ok(None);
        };
        let token = self
            .repo
            .issue_token(user.id, TokenPurpose::Recovery, self.cfg.reset_token_ttl_minutes)
            .await?;
        info!(
            user_id = %user.id,
            link = %format!("{}/auth/callback?code={}&type=recovery", self.cfg.site_url, token),
            "password_reset_link_issued"
        );
        Ok(Some(token))
    }

    /// Check a recovery token without consuming it (used by the callback
    /// redirect before the user has typed a new password).
    pub async fn validate_reset_token(&self, token: &str) -> Result<(), AuthError> {
        if self.repo.token_valid(token, TokenPurpose::Recovery).await? {
            Ok(())
        } else {
            Err(AuthError::LinkExpired)
        }
    }

    /// Second phase of the password reset: consume the token and re-hash
    /// the credential. A consumed or expired token is terminal.
    #[instrument(skip(self, token, new_password))]
    pub async fn complete_password_reset(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        let user_id = self
            .repo
            .consume_token(token, TokenPurpose::Recovery)
            .await?
            .ok_or(AuthError::LinkExpired)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(new_password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        self.repo
            .upsert_password(user_id, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(%user_id, "password_reset_completed");
        Ok(())
    }

    /// Redeem a signup token and mark the account confirmed. Failure is
    /// terminal for that token.
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str) -> Result<uuid::Uuid, AuthError> {
        let user_id = self
            .repo
            .consume_token(token, TokenPurpose::Signup)
            .await?
            .ok_or(AuthError::LinkExpired)?;
        self.repo.mark_email_confirmed(user_id).await?;
        info!(%user_id, "email_verified");
        Ok(user_id)
    }

    fn issue_jwt(&self, user: &AuthUser) -> Result<Option<String>, AuthError> {
        let Some(secret) = &self.cfg.jwt_secret else { return Ok(None) };
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.session_ttl_hours)).timestamp() as usize;
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id.to_string(),
            role: user.role.as_str().to_string(),
            exp,
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc(cfg: AuthConfig) -> (Arc<MockAuthRepository>, AuthService<MockAuthRepository>) {
        let repo = Arc::new(MockAuthRepository::default());
        (repo.clone(), AuthService::new(repo, cfg))
    }

    fn reg(email: &str) -> RegisterInput {
        RegisterInput { email: email.into(), full_name: "Tester".into(), password: "Passw0rd!".into() }
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let (_, svc) = svc(AuthConfig::default());
        svc.register(reg("dup@example.com")).await.unwrap();
        let err = svc.register(reg("dup@example.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "User already exists");
    }

    #[tokio::test]
    async fn register_without_confirmation_yields_session() {
        let cfg = AuthConfig { jwt_secret: Some("s".into()), ..AuthConfig::default() };
        let (_, svc) = svc(cfg);
        let r = svc.register(reg("now@example.com")).await.unwrap();
        assert!(r.session.is_some());
        assert!(r.verification_token.is_none());
        assert!(r.user.email_confirmed);
    }

    #[tokio::test]
    async fn register_with_confirmation_blocks_login_until_verified() {
        let cfg = AuthConfig {
            jwt_secret: Some("s".into()),
            require_email_confirmation: true,
            ..AuthConfig::default()
        };
        let (_, svc) = svc(cfg);
        let r = svc.register(reg("pending@example.com")).await.unwrap();
        assert!(r.session.is_none());
        let token = r.verification_token.expect("signup token");

        let err = svc
            .login(LoginInput { email: "pending@example.com".into(), password: "Passw0rd!".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotConfirmed));

        let uid = svc.verify_email(&token).await.unwrap();
        assert_eq!(uid, r.user.id);
        let session = svc
            .login(LoginInput { email: "pending@example.com".into(), password: "Passw0rd!".into() })
            .await
            .unwrap();
        assert!(session.token.is_some());

        // The token is one-shot.
        assert!(matches!(svc.verify_email(&token).await.unwrap_err(), AuthError::LinkExpired));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (_, svc) = svc(AuthConfig::default());
        svc.register(reg("w@example.com")).await.unwrap();
        let err = svc
            .login(LoginInput { email: "w@example.com".into(), password: "nope-nope".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn admin_login_rejects_plain_users() {
        let cfg = AuthConfig { jwt_secret: Some("s".into()), ..AuthConfig::default() };
        let (_, svc) = svc(cfg);
        svc.register(reg("plain@example.com")).await.unwrap();
        let err = svc
            .login_admin(LoginInput { email: "plain@example.com".into(), password: "Passw0rd!".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
    }

    #[tokio::test]
    async fn bootstrap_admin_is_single_use() {
        let cfg = AuthConfig { jwt_secret: Some("s".into()), ..AuthConfig::default() };
        let (_, svc) = svc(cfg);
        let first = svc.bootstrap_admin("root@example.com", "Sup3rSecret").await.unwrap();
        assert_eq!(first.user.role, Role::Admin);
        assert!(first.session.is_some());

        let err = svc.bootstrap_admin("other@example.com", "Sup3rSecret").await.unwrap_err();
        assert_eq!(err.to_string(), "Admin already exists");
    }

    #[tokio::test]
    async fn password_reset_roundtrip() {
        let cfg = AuthConfig { jwt_secret: Some("s".into()), ..AuthConfig::default() };
        let (_, svc) = svc(cfg);
        svc.register(reg("r@example.com")).await.unwrap();

        let token = svc.request_password_reset("r@example.com").await.unwrap().expect("token");
        svc.validate_reset_token(&token).await.unwrap();
        svc.complete_password_reset(&token, "NewPassw0rd").await.unwrap();

        // Old password no longer works, new one does.
        assert!(svc
            .login(LoginInput { email: "r@example.com".into(), password: "Passw0rd!".into() })
            .await
            .is_err());
        assert!(svc
            .login(LoginInput { email: "r@example.com".into(), password: "NewPassw0rd".into() })
            .await
            .is_ok());

        // Second completion with the same token fails.
        let err = svc.complete_password_reset(&token, "AnotherPass1").await.unwrap_err();
        assert!(matches!(err, AuthError::LinkExpired));
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let (repo, svc) = svc(AuthConfig::default());
        svc.register(reg("exp@example.com")).await.unwrap();
        let token = svc.request_password_reset("exp@example.com").await.unwrap().unwrap();
        repo.expire_token(&token);
        assert!(matches!(svc.validate_reset_token(&token).await.unwrap_err(), AuthError::LinkExpired));
        assert!(matches!(
            svc.complete_password_reset(&token, "NewPassw0rd").await.unwrap_err(),
            AuthError::LinkExpired
        ));
    }

    #[tokio::test]
    async fn reset_for_unknown_email_does_not_leak() {
        let (_, svc) = svc(AuthConfig::default());
        let out = svc.request_password_reset("ghost@example.com").await.unwrap();
        assert!(out.is_none());
    }
}
