use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_user(model: models::user::Model) -> AuthUser {
    AuthUser {
        id: model.id,
        username: model.username,
        email: model.email,
        name: model.name,
    }
}

fn to_credentials(model: models::user_credentials::Model) -> Credentials {
    Credentials {
        user_id: model.user_id,
        password_hash: model.password_hash,
        password_algorithm: model.password_algorithm,
        email_verification_key: model.email_verification_key,
        brute_force_value: model.brute_force_value,
        brute_force_updated: model.brute_force_updated.with_timezone(&Utc),
    }
}

fn repo_err(e: sea_orm::DbErr) -> AuthError {
    AuthError::Repository(e.to_string())
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find()
            .filter(
                Condition::any()
                    .add(models::user::Column::LowercaseUsername.eq(identifier.to_lowercase()))
                    .add(models::user::Column::Email.eq(identifier.to_string())),
            )
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(res.map(to_user))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(res.map(to_user))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find()
            .filter(models::user::Column::LowercaseUsername.eq(username.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(res.map(to_user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find()
            .filter(models::user::Column::Email.eq(email.to_string()))
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(res.map(to_user))
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        let now = Utc::now();
        let created = models::user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            lowercase_username: Set(username.to_lowercase()),
            email: Set(email.to_string()),
            name: Set(name.map(|n| n.to_string())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await
        .map_err(repo_err)?;
        Ok(to_user(created))
    }

    async fn update_user(&self, user: AuthUser) -> Result<AuthUser, AuthError> {
        let existing = models::user::Entity::find_by_id(user.id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .ok_or(AuthError::NotFound)?;
        let updated = models::user::ActiveModel {
            id: Set(existing.id),
            username: Set(existing.username),
            lowercase_username: Set(existing.lowercase_username),
            email: Set(user.email),
            name: Set(user.name),
            created_at: Set(existing.created_at),
            updated_at: Set(Utc::now().into()),
        }
        .update(&self.db)
        .await
        .map_err(repo_err)?;
        Ok(to_user(updated))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        // Credentials go with the user via the cascading foreign key.
        models::user::Entity::delete_by_id(user_id)
            .exec(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(res.map(to_credentials))
    }

    async fn upsert_password(
        &self,
        user_id: Uuid,
        password_hash: String,
        password_algorithm: String,
        email_verification_key: Option<String>,
    ) -> Result<Credentials, AuthError> {
        let now = Utc::now();
        let existing = models::user_credentials::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        let row = models::user_credentials::ActiveModel {
            user_id: Set(user_id),
            password_hash: Set(password_hash),
            password_algorithm: Set(password_algorithm),
            email_verification_key: Set(email_verification_key),
            brute_force_value: Set(0.0),
            brute_force_updated: Set(now.into()),
        };
        let saved = if existing.is_some() {
            row.update(&self.db).await.map_err(repo_err)?
        } else {
            row.insert(&self.db).await.map_err(repo_err)?
        };
        Ok(to_credentials(saved))
    }

    async fn set_password(
        &self,
        user_id: Uuid,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<(), AuthError> {
        let existing = models::user_credentials::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .ok_or(AuthError::NotFound)?;
        let mut row: models::user_credentials::ActiveModel = existing.into();
        row.password_hash = Set(password_hash);
        row.password_algorithm = Set(password_algorithm);
        row.update(&self.db).await.map_err(repo_err)?;
        Ok(())
    }

    async fn save_brute_force(
        &self,
        user_id: Uuid,
        value: f64,
        updated: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let existing = models::user_credentials::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .ok_or(AuthError::NotFound)?;
        let mut row: models::user_credentials::ActiveModel = existing.into();
        row.brute_force_value = Set(value);
        row.brute_force_updated = Set(updated.into());
        row.update(&self.db).await.map_err(repo_err)?;
        Ok(())
    }

    async fn find_user_by_verification_key(
        &self,
        key: &str,
    ) -> Result<Option<AuthUser>, AuthError> {
        let cred = models::user_credentials::Entity::find()
            .filter(models::user_credentials::Column::EmailVerificationKey.eq(key.to_string()))
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        let Some(cred) = cred else { return Ok(None) };
        self.find_user_by_id(cred.user_id).await
    }

    async fn clear_verification_key(&self, user_id: Uuid) -> Result<(), AuthError> {
        let existing = models::user_credentials::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(repo_err)?
            .ok_or(AuthError::NotFound)?;
        let mut row: models::user_credentials::ActiveModel = existing.into();
        row.email_verification_key = Set(None);
        row.update(&self.db).await.map_err(repo_err)?;
        Ok(())
    }
}
