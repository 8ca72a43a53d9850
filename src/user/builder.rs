//! Typed builder for User.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::crypto::Crypto;
use crate::user::{User, UserService};

/// [`User`] builder.
#[derive(Debug, Clone)]
pub struct UserBuilder<Id, Email> {
    id: Id,
    name: String,
    email: Email,
    password: String,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            id: Missing,
            name: String::default(),
            email: Missing,
            password: String::default(),
        }
    }
}

impl<Email> UserBuilder<Missing, Email> {
    /// Update `id` field on [`UserBuilder`].
    pub fn id(self, id: i64) -> UserBuilder<Present<i64>, Email> {
        UserBuilder {
            id: Present(id),
            name: self.name,
            email: self.email,
            password: self.password,
        }
    }
}

impl<Id> UserBuilder<Id, Missing> {
    /// Update `email` field on [`UserBuilder`].
    ///
    /// Emails are trimmed and lowercased.
    pub fn email(
        self,
        email: impl AsRef<str>,
    ) -> UserBuilder<Id, Present<String>> {
        UserBuilder {
            id: self.id,
            name: self.name,
            email: Present(normalize_email(email.as_ref())),
            password: self.password,
        }
    }
}

impl<Id, Email> UserBuilder<Id, Email> {
    /// Update `password` field on [`UserBuilder`].
    pub fn password(mut self, password: impl ToString) -> Self {
        self.password = password.to_string();
        self
    }

    /// Update `name` field on [`UserBuilder`].
    pub fn name(mut self, name: impl AsRef<str>) -> Self {
        self.name = name.as_ref().trim().to_owned();
        self
    }
}

impl UserBuilder<Missing, Present<String>> {
    /// Build a [`User`] with `email`.
    pub fn build(
        self,
        pool: Pool<Postgres>,
        crypto: Arc<Crypto>,
    ) -> UserService {
        let user = User {
            name: self.name,
            email: self.email.0,
            password: self.password,
            ..Default::default()
        };

        UserService::new(user, pool, crypto)
    }
}

impl UserBuilder<Present<i64>, Missing> {
    /// Build a [`User`] with `id`.
    pub fn build(
        self,
        pool: Pool<Postgres>,
        crypto: Arc<Crypto>,
    ) -> UserService {
        let user = User {
            id: self.id.0,
            name: self.name,
            password: self.password,
            ..Default::default()
        };

        UserService::new(user, pool, crypto)
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@HRIS.test "), "jane.doe@hris.test");
    }
}
