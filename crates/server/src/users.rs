//! User service: registration, password validation and the federated
//! upsert.

use crate::entity::user;
use crate::password::{hash_password, verify_password};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

/// Failures of password-account registration.
#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("Storage error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, sea_orm::DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
    }

    /// Register a password account. Email is the uniqueness key; a taken
    /// email is reported as such so the HTTP layer can answer with a
    /// conflict instead of a generic failure.
    #[tracing::instrument(skip(self, password))]
    pub async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        password: &str,
    ) -> Result<user::Model, CreateUserError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(CreateUserError::EmailTaken);
        }

        let hash = hash_password(password).map_err(CreateUserError::Hash)?;
        let now = OffsetDateTime::now_utc();
        let user = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(email.to_string()),
            name: Set(name.map(String::from)),
            picture: Set(None),
            password_hash: Set(Some(hash)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(user.insert(self.db.as_ref()).await?)
    }

    /// Validate an email/password pair for password login.
    ///
    /// Unknown email, missing password hash (federated-only account) and a
    /// wrong password all return `None` so callers can emit one generic
    /// rejection without revealing which check failed.
    #[tracing::instrument(skip(self, password))]
    pub async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<user::Model>, sea_orm::DbErr> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        let Some(hash) = user.password_hash.as_deref() else {
            return Ok(None);
        };
        if !verify_password(password, hash) {
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Upsert a federated identity keyed by email: create the user if
    /// absent, otherwise refresh name and picture. Never creates a second
    /// row for an existing email.
    #[tracing::instrument(skip(self))]
    pub async fn upsert_federated(
        &self,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<user::Model, sea_orm::DbErr> {
        let now = OffsetDateTime::now_utc();

        if let Some(existing) = self.find_by_email(email).await? {
            let mut active: user::ActiveModel = existing.into();
            if let Some(n) = name {
                active.name = Set(Some(n.to_string()));
            }
            if let Some(p) = picture {
                active.picture = Set(Some(p.to_string()));
            }
            active.updated_at = Set(now);
            return active.update(self.db.as_ref()).await;
        }

        let user = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(email.to_string()),
            name: Set(name.map(String::from)),
            picture: Set(picture.map(String::from)),
            password_hash: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        user.insert(self.db.as_ref()).await
    }
}
