use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, Role, TokenPurpose};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        role: Role,
        confirmed: bool,
    ) -> Result<AuthUser, AuthError>;
    async fn admin_exists(&self) -> Result<bool, AuthError>;
    async fn mark_email_confirmed(&self, user_id: Uuid) -> Result<(), AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(
        &self,
        user_id: Uuid,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<Credentials, AuthError>;

    /// Issue a one-shot token for the given purpose; returns the token text.
    async fn issue_token(
        &self,
        user_id: Uuid,
        purpose: TokenPurpose,
        ttl_minutes: i64,
    ) -> Result<String, AuthError>;
    /// True if a token is still redeemable (right purpose, unconsumed,
    /// unexpired) without consuming it.
    async fn token_valid(&self, token: &str, purpose: TokenPurpose) -> Result<bool, AuthError>;
    /// Redeem a token; None when unknown, already consumed, or expired.
    async fn consume_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<Uuid>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockToken {
        user_id: Uuid,
        purpose: TokenPurpose,
        consumed: bool,
        expired: bool,
    }

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,   // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>,  // key: user_id
        tokens: Mutex<HashMap<String, MockToken>>, // key: token text
    }

    impl MockAuthRepository {
        /// Force-expire a token so expiry paths can be exercised.
        pub fn expire_token(&self, token: &str) {
            if let Some(t) = self.tokens.lock().unwrap().get_mut(token) {
                t.expired = true;
            }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(email).cloned())
        }

        async fn create_user(
            &self,
            email: &str,
            full_name: &str,
            role: Role,
            confirmed: bool,
        ) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(email) {
                return Err(AuthError::Conflict("User already exists".into()));
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                role,
                email_confirmed: confirmed,
            };
            users.insert(email.to_string(), user.clone());
            Ok(user)
        }

        async fn admin_exists(&self) -> Result<bool, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().any(|u| u.role == Role::Admin))
        }

        async fn mark_email_confirmed(&self, user_id: Uuid) -> Result<(), AuthError> {
            let mut users = self.users.lock().unwrap();
            for user in users.values_mut() {
                if user.id == user_id {
                    user.email_confirmed = true;
                    return Ok(());
                }
            }
            Err(AuthError::NotFound)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(
            &self,
            user_id: Uuid,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }

        async fn issue_token(
            &self,
            user_id: Uuid,
            purpose: TokenPurpose,
            _ttl_minutes: i64,
        ) -> Result<String, AuthError> {
            let token = Uuid::new_v4().simple().to_string();
            self.tokens.lock().unwrap().insert(
                token.clone(),
                MockToken { user_id, purpose, consumed: false, expired: false },
            );
            Ok(token)
        }

        async fn token_valid(&self, token: &str, purpose: TokenPurpose) -> Result<bool, AuthError> {
            let tokens = self.tokens.lock().unwrap();
            Ok(tokens
                .get(token)
                .map(|t| t.purpose == purpose && !t.consumed && !t.expired)
                .unwrap_or(false))
        }

        async fn consume_token(
            &self,
            token: &str,
            purpose: TokenPurpose,
        ) -> Result<Option<Uuid>, AuthError> {
            let mut tokens = self.tokens.lock().unwrap();
            match tokens.get_mut(token) {
                Some(t) if t.purpose == purpose && !t.consumed && !t.expired => {
                    t.consumed = true;
                    Ok(Some(t.user_id))
                }
                _ => Ok(None),
            }
        }
    }
}
