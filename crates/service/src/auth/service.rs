use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header as JwtHeader};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::domain::{
    AuthSession, AuthUser, ChangePassword, Claims, LoginInput, RegisterInput, UpdateAccount,
};
use super::errors::AuthError;
use super::repository::AuthRepository;
use crate::mail::Mailer;

/// Failed logins add one point; points drain at `DECAY_PER_DAY`. A
/// account at or above `BLOCK_THRESHOLD` points is refused outright.
const DECAY_PER_DAY: f64 = 10.0;
const BLOCK_THRESHOLD: f64 = 20.0;

const VERIFICATION_KEY_LEN: usize = 64;

/// Account service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub verify_base_url: String,
}

/// Account business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    mailer: Arc<dyn Mailer>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, mailer: Arc<dyn Mailer>, cfg: AuthConfig) -> Self {
        Self { repo, mailer, cfg }
    }

    /// Register a new user. The account starts unverified and cannot log
    /// in until the emailed key comes back through `verify_email`.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        models::user::validate_username(&input.username)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        models::user::validate_email(&input.email)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if let Some(existing) = self.repo.find_user_by_username(&input.username).await? {
            debug!("username taken: {}", existing.username);
            return Err(AuthError::Conflict);
        }
        if self.repo.find_user_by_email(&input.email).await?.is_some() {
            return Err(AuthError::Conflict);
        }

        let user = self
            .repo
            .create_user(&input.username, &input.email, input.name.as_deref())
            .await?;
        let hash = hash_password(&input.password)?;
        let key: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(VERIFICATION_KEY_LEN)
            .map(char::from)
            .collect();
        self.repo
            .upsert_password(user.id, hash, "argon2".into(), Some(key.clone()))
            .await?;

        let link = format!("{}/?key={}", self.cfg.verify_base_url.trim_end_matches('/'), key);
        let body = format!(
            "Welcome, {}!\n\nPlease confirm your email address by visiting:\n{}\n",
            user.username, link
        );
        if let Err(e) = self.mailer.send(&user.email, "Confirm your email", &body).await {
            // The account is unusable without the mail; roll it back so
            // the username is not burned.
            if let Err(cleanup) = self.repo.delete_user(user.id).await {
                error!(user_id = %user.id, error = %cleanup, "failed to clean up after mail error");
            }
            return Err(AuthError::Mail(e.to_string()));
        }

        info!(user_id = %user.id, username = %user.username, "user_registered");
        Ok(user)
    }

    /// Authenticate by username or email and issue a token.
    #[instrument(skip(self, input), fields(identifier = %input.identifier))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self
            .repo
            .find_user_by_identifier(&input.identifier)
            .await?
            .ok_or(AuthError::NotFound)?;
        let cred = self
            .repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if cred.email_verification_key.is_some() {
            return Err(AuthError::Unverified);
        }

        let now = Utc::now();
        let elapsed_days = (now - cred.brute_force_updated).num_seconds() as f64 / 86_400.0;
        let decayed = (cred.brute_force_value - elapsed_days * DECAY_PER_DAY).max(0.0);
        if decayed >= BLOCK_THRESHOLD {
            info!(user_id = %user.id, value = decayed, "login_blocked");
            return Err(AuthError::Throttled);
        }

        let parsed = PasswordHash::new(&cred.password_hash)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default()
            .verify_password(input.password.as_bytes(), &parsed)
            .is_err()
        {
            self.repo.save_brute_force(user.id, decayed + 1.0, now).await?;
            return Err(AuthError::Unauthorized);
        }
        self.repo.save_brute_force(user.id, decayed, now).await?;

        let exp = (now + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize;
        let claims = Claims { sub: user.username.clone(), uid: user.id.to_string(), exp };
        let token = encode(
            &JwtHeader::default(),
            &claims,
            &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenError(e.to_string()))?;

        info!(user_id = %user.id, username = %user.username, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Redeem an emailed verification key. Unknown keys read as not
    /// found; a key can only be used once.
    pub async fn verify_email(&self, key: &str) -> Result<AuthUser, AuthError> {
        let user = self
            .repo
            .find_user_by_verification_key(key)
            .await?
            .ok_or(AuthError::NotFound)?;
        self.repo.clear_verification_key(user.id).await?;
        info!(user_id = %user.id, "email_verified");
        Ok(user)
    }

    pub async fn account(&self, user_id: Uuid) -> Result<AuthUser, AuthError> {
        self.repo
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_account(
        &self,
        user_id: Uuid,
        patch: UpdateAccount,
    ) -> Result<AuthUser, AuthError> {
        let mut user = self.account(user_id).await?;
        if let Some(email) = patch.email {
            models::user::validate_email(&email)
                .map_err(|e| AuthError::Validation(e.to_string()))?;
            if let Some(other) = self.repo.find_user_by_email(&email).await? {
                if other.id != user.id {
                    return Err(AuthError::Conflict);
                }
            }
            user.email = email;
        }
        if let Some(name) = patch.name {
            user.name = Some(name);
        }
        self.repo.update_user(user).await
    }

    /// The current password must verify before the new one is accepted.
    #[instrument(skip(self, input))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        input: ChangePassword,
    ) -> Result<(), AuthError> {
        if input.new_password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        let cred = self
            .repo
            .get_credentials(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        let parsed = PasswordHash::new(&cred.password_hash)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default()
            .verify_password(input.current_password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(AuthError::Unauthorized);
        }
        let hash = hash_password(&input.new_password)?;
        self.repo.set_password(user_id, hash, "argon2".into()).await?;
        info!(user_id = %user_id, "password_changed");
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;
    use crate::mail::mock::RecordingMailer;
    use chrono::Duration;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 12,
            verify_base_url: "https://example.com/verify".into(),
        }
    }

    fn register_input(username: &str, email: &str) -> RegisterInput {
        RegisterInput {
            username: username.into(),
            email: email.into(),
            name: None,
            password: "Secret123".into(),
        }
    }

    async fn registered_and_verified(
        svc: &AuthService<MockAuthRepository>,
        username: &str,
        email: &str,
    ) -> AuthUser {
        let user = svc.register(register_input(username, email)).await.unwrap();
        let cred = svc.repo.get_credentials(user.id).await.unwrap().unwrap();
        svc.verify_email(cred.email_verification_key.as_deref().unwrap())
            .await
            .unwrap()
    }

    fn service(
        repo: Arc<MockAuthRepository>,
        mailer: Arc<RecordingMailer>,
    ) -> AuthService<MockAuthRepository> {
        AuthService::new(repo, mailer, config())
    }

    #[tokio::test]
    async fn register_sends_a_verification_mail_and_blocks_duplicates() {
        let repo = Arc::new(MockAuthRepository::default());
        let mailer = Arc::new(RecordingMailer::default());
        let svc = service(repo.clone(), mailer.clone());

        let user = svc.register(register_input("alice", "alice@example.com")).await.unwrap();
        assert_eq!(mailer.sent_count(), 1);
        assert!(repo.credentials(user.id).unwrap().email_verification_key.is_some());

        let err = svc
            .register(register_input("Alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
        let err = svc
            .register(register_input("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn failed_mail_delivery_rolls_the_account_back() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = service(repo.clone(), Arc::new(RecordingMailer::failing()));

        let err = svc.register(register_input("alice", "alice@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Mail(_)));
        assert_eq!(repo.user_count(), 0);
    }

    #[tokio::test]
    async fn login_refuses_unknown_unverified_and_wrong_passwords() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = service(repo.clone(), Arc::new(RecordingMailer::default()));

        let err = svc
            .login(LoginInput { identifier: "ghost".into(), password: "Secret123".into() })
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "user");

        let user = svc.register(register_input("alice", "alice@example.com")).await.unwrap();
        let err = svc
            .login(LoginInput { identifier: "alice".into(), password: "Secret123".into() })
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "unverified");

        let key = repo.credentials(user.id).unwrap().email_verification_key.unwrap();
        svc.verify_email(&key).await.unwrap();

        let err = svc
            .login(LoginInput { identifier: "alice".into(), password: "wrong-pass".into() })
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "password");
        assert!(repo.credentials(user.id).unwrap().brute_force_value >= 1.0);

        // Email works as the identifier too.
        let session = svc
            .login(LoginInput {
                identifier: "alice@example.com".into(),
                password: "Secret123".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.user.username, "alice");
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn repeated_failures_lock_the_account_and_the_lock_decays() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = service(repo.clone(), Arc::new(RecordingMailer::default()));
        let user = registered_and_verified(&svc, "alice", "alice@example.com").await;

        repo.save_brute_force(user.id, BLOCK_THRESHOLD, Utc::now()).await.unwrap();
        let err = svc
            .login(LoginInput { identifier: "alice".into(), password: "Secret123".into() })
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "brute");

        // Two days of decay drain 20 points.
        repo.save_brute_force(user.id, BLOCK_THRESHOLD, Utc::now() - Duration::days(2))
            .await
            .unwrap();
        svc.login(LoginInput { identifier: "alice".into(), password: "Secret123".into() })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn verification_keys_are_single_use() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = service(repo.clone(), Arc::new(RecordingMailer::default()));
        let user = svc.register(register_input("alice", "alice@example.com")).await.unwrap();
        let key = repo.credentials(user.id).unwrap().email_verification_key.unwrap();

        svc.verify_email(&key).await.unwrap();
        let err = svc.verify_email(&key).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn change_password_requires_the_current_one() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = service(repo.clone(), Arc::new(RecordingMailer::default()));
        let user = registered_and_verified(&svc, "alice", "alice@example.com").await;

        let err = svc
            .change_password(
                user.id,
                ChangePassword {
                    current_password: "wrong".into(),
                    new_password: "NewSecret1".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));

        svc.change_password(
            user.id,
            ChangePassword {
                current_password: "Secret123".into(),
                new_password: "NewSecret1".into(),
            },
        )
        .await
        .unwrap();
        svc.login(LoginInput { identifier: "alice".into(), password: "NewSecret1".into() })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_account_rejects_taken_emails() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = service(repo.clone(), Arc::new(RecordingMailer::default()));
        let alice = registered_and_verified(&svc, "alice", "alice@example.com").await;
        let _bob = registered_and_verified(&svc, "bob", "bob@example.com").await;

        let err = svc
            .update_account(
                alice.id,
                UpdateAccount { email: Some("bob@example.com".into()), name: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));

        let updated = svc
            .update_account(
                alice.id,
                UpdateAccount { email: None, name: Some("Alice A.".into()) },
            )
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Alice A."));
    }
}
