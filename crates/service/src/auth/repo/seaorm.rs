use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, Role, TokenPurpose};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(p: models::profile::Model) -> AuthUser {
    AuthUser {
        id: p.id,
        email: p.email,
        full_name: p.full_name,
        // Unknown role strings cannot appear: the column is validated on
        // every write. Fall back to the least privilege anyway.
        role: Role::parse(&p.role).unwrap_or(Role::User),
        email_confirmed: p.email_confirmed_at.is_some(),
    }
}

fn purpose_str(p: TokenPurpose) -> &'static str {
    match p {
        TokenPurpose::Signup => models::auth_token::PURPOSE_SIGNUP,
        TokenPurpose::Recovery => models::auth_token::PURPOSE_RECOVERY,
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::profile::find_by_email(&self.db, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_auth_user))
    }

    async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        role: Role,
        confirmed: bool,
    ) -> Result<AuthUser, AuthError> {
        let created = models::profile::create(&self.db, email, full_name, role.as_str(), confirmed)
            .await
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(to_auth_user(created))
    }

    async fn admin_exists(&self) -> Result<bool, AuthError> {
        models::profile::admin_exists(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))
    }

    async fn mark_email_confirmed(&self, user_id: Uuid) -> Result<(), AuthError> {
        models::profile::mark_email_confirmed(&self.db, user_id)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials {
            user_id: c.user_id,
            password_hash: c.password_hash,
            password_algorithm: c.password_algorithm,
        }))
    }

    async fn upsert_password(
        &self,
        user_id: Uuid,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(Credentials {
            user_id: c.user_id,
            password_hash: c.password_hash,
            password_algorithm: c.password_algorithm,
        })
    }

    async fn issue_token(
        &self,
        user_id: Uuid,
        purpose: TokenPurpose,
        ttl_minutes: i64,
    ) -> Result<String, AuthError> {
        let row = models::auth_token::issue(&self.db, user_id, purpose_str(purpose), ttl_minutes)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(row.token)
    }

    async fn token_valid(&self, token: &str, purpose: TokenPurpose) -> Result<bool, AuthError> {
        let found = models::auth_token::find_valid(&self.db, token, purpose_str(purpose))
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(found.is_some())
    }

    async fn consume_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<Uuid>, AuthError> {
        models::auth_token::consume(&self.db, token, purpose_str(purpose))
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))
    }
}
