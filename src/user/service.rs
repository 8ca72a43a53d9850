use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::crypto::Crypto;
use crate::error::{Result, ServerError};
use crate::token::{NewAccessToken, TokenManager};
use crate::user::{User, UserRepository, email_taken};

/// User manager.
#[derive(Clone)]
pub struct UserService {
    pub repo: UserRepository,
    pub crypto: Arc<Crypto>,
    pub data: User,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(user: User, pool: Pool<Postgres>, crypto: Arc<Crypto>) -> Self {
        Self {
            data: user,
            repo: UserRepository::new(pool),
            crypto,
        }
    }

    /// Create builded user.
    ///
    /// Hash password, reject known emails, then insert.
    pub async fn create_user(mut self) -> Result<Self> {
        if self.repo.email_exists(&self.data.email).await? {
            return Err(ServerError::Validation(email_taken()));
        }

        self.data.password = self.crypto.pwd.hash_password(&self.data.password)?;
        self.data = self.repo.insert(&self.data).await?;

        tracing::info!(user_id = self.data.id, "user registered");
        Ok(self)
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(self) -> Result<Option<Self>> {
        let user = self.repo.find_by_id(self.data.id).await?;
        Ok(user.map(|data| Self { data, ..self }))
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(self) -> Result<Option<Self>> {
        let user = self.repo.find_by_email(&self.data.email).await?;
        Ok(user.map(|data| Self { data, ..self }))
    }

    /// Check a plain password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        self.crypto.pwd.verify_password(password, &self.data.password)
    }

    /// Issue a new personal access token to user.
    pub async fn create_token(
        &self,
        tokens: &TokenManager,
        name: &str,
    ) -> Result<NewAccessToken> {
        tokens.create(self.data.id, name).await
    }
}
