use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for account persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Matches the lowercased username or the exact email address.
    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<AuthUser, AuthError>;
    async fn update_user(&self, user: AuthUser) -> Result<AuthUser, AuthError>;
    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    /// Creates or replaces the credentials row, including the pending
    /// verification key.
    async fn upsert_password(
        &self,
        user_id: Uuid,
        password_hash: String,
        password_algorithm: String,
        email_verification_key: Option<String>,
    ) -> Result<Credentials, AuthError>;
    /// Replaces the hash only, leaving verification state alone.
    async fn set_password(
        &self,
        user_id: Uuid,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<(), AuthError>;
    async fn save_brute_force(
        &self,
        user_id: Uuid,
        value: f64,
        updated: DateTime<Utc>,
    ) -> Result<(), AuthError>;
    async fn find_user_by_verification_key(&self, key: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn clear_verification_key(&self, user_id: Uuid) -> Result<(), AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<Uuid, AuthUser>>,
        creds: Mutex<HashMap<Uuid, Credentials>>,
    }

    impl MockAuthRepository {
        pub fn credentials(&self, user_id: Uuid) -> Option<Credentials> {
            self.creds.lock().unwrap().get(&user_id).cloned()
        }

        pub fn user_count(&self) -> usize {
            self.users.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_identifier(
            &self,
            identifier: &str,
        ) -> Result<Option<AuthUser>, AuthError> {
            let lowered = identifier.to_lowercase();
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.username.to_lowercase() == lowered || u.email == identifier)
                .cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn find_user_by_username(
            &self,
            username: &str,
        ) -> Result<Option<AuthUser>, AuthError> {
            let lowered = username.to_lowercase();
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.username.to_lowercase() == lowered)
                .cloned())
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn create_user(
            &self,
            username: &str,
            email: &str,
            name: Option<&str>,
        ) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let lowered = username.to_lowercase();
            if users
                .values()
                .any(|u| u.username.to_lowercase() == lowered || u.email == email)
            {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email: email.to_string(),
                name: name.map(|n| n.to_string()),
            };
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update_user(&self, user: AuthUser) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if !users.contains_key(&user.id) {
                return Err(AuthError::NotFound);
            }
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
            self.users.lock().unwrap().remove(&user_id);
            self.creds.lock().unwrap().remove(&user_id);
            Ok(())
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            Ok(self.creds.lock().unwrap().get(&user_id).cloned())
        }

        async fn upsert_password(
            &self,
            user_id: Uuid,
            password_hash: String,
            password_algorithm: String,
            email_verification_key: Option<String>,
        ) -> Result<Credentials, AuthError> {
            let c = Credentials {
                user_id,
                password_hash,
                password_algorithm,
                email_verification_key,
                brute_force_value: 0.0,
                brute_force_updated: Utc::now(),
            };
            self.creds.lock().unwrap().insert(user_id, c.clone());
            Ok(c)
        }

        async fn set_password(
            &self,
            user_id: Uuid,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<(), AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = creds.get_mut(&user_id).ok_or(AuthError::NotFound)?;
            c.password_hash = password_hash;
            c.password_algorithm = password_algorithm;
            Ok(())
        }

        async fn save_brute_force(
            &self,
            user_id: Uuid,
            value: f64,
            updated: DateTime<Utc>,
        ) -> Result<(), AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = creds.get_mut(&user_id).ok_or(AuthError::NotFound)?;
            c.brute_force_value = value;
            c.brute_force_updated = updated;
            Ok(())
        }

        async fn find_user_by_verification_key(
            &self,
            key: &str,
        ) -> Result<Option<AuthUser>, AuthError> {
            let creds = self.creds.lock().unwrap();
            let users = self.users.lock().unwrap();
            Ok(creds
                .values()
                .find(|c| c.email_verification_key.as_deref() == Some(key))
                .and_then(|c| users.get(&c.user_id).cloned()))
        }

        async fn clear_verification_key(&self, user_id: Uuid) -> Result<(), AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = creds.get_mut(&user_id).ok_or(AuthError::NotFound)?;
            c.email_verification_key = None;
            Ok(())
        }
    }
}
