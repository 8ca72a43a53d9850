//! Manage personal access tokens.
//!
//! A token is handed out once as `"{id}|{secret}"`. Only a SHA-256 digest of
//! the secret is kept on database.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::crypto::{Crypto, random_string};
use crate::error::{Result, ServerError};

pub const DEFAULT_TOKEN_NAME: &str = "auth_token";
pub const SECRET_LENGTH: usize = 40;
const SEPARATOR: char = '|';

const TOKEN_COLUMNS: &str =
    "id, user_id, name, token, last_used_at, expires_at, created_at";

/// Token as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct AccessToken {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(skip)]
    pub token: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether token can still authenticate at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Freshly issued token alongside its only plain-text copy.
#[derive(Clone, Debug)]
pub struct NewAccessToken {
    pub access_token: AccessToken,
    pub plain_text_token: String,
}

/// Manage personal access tokens.
#[derive(Clone)]
pub struct TokenManager {
    pool: Pool<Postgres>,
    crypto: Arc<Crypto>,
    expiration: Option<Duration>,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(pool: Pool<Postgres>, crypto: Arc<Crypto>) -> Self {
        Self {
            pool,
            crypto,
            expiration: None,
        }
    }

    /// Set token lifetime in minutes.
    ///
    /// Lifetimes whose expiry date cannot be represented are rejected.
    pub fn expiration(mut self, minutes: Option<u64>) -> Result<Self> {
        let Some(minutes) = minutes else {
            self.expiration = None;
            return Ok(self);
        };

        let lifetime = i64::try_from(minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .filter(|lifetime| expiry_from_now(*lifetime).is_some())
            .ok_or_else(|| ServerError::Internal {
                details: format!(
                    "token expiration of {minutes} minutes is out of range"
                ),
                source: None,
            })?;

        self.expiration = Some(lifetime);
        Ok(self)
    }

    /// Issue a new token for `user_id`.
    pub async fn create(
        &self,
        user_id: i64,
        name: &str,
    ) -> Result<NewAccessToken> {
        let secret = random_string(SECRET_LENGTH);
        let digest = self.crypto.hasher.digest(&secret);
        let expires_at = match self.expiration {
            Some(lifetime) => {
                Some(expiry_from_now(lifetime).ok_or_else(|| ServerError::Internal {
                    details: "token expiry date overflows".into(),
                    source: None,
                })?)
            },
            None => None,
        };

        let query = format!(
            "INSERT INTO personal_access_tokens (user_id, name, token, expires_at)
                VALUES ($1, $2, $3, $4) RETURNING {TOKEN_COLUMNS}"
        );
        let access_token = sqlx::query_as::<_, AccessToken>(&query)
            .bind(user_id)
            .bind(name)
            .bind(&digest)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await?;

        let plain_text_token =
            format!("{}{SEPARATOR}{secret}", access_token.id);

        Ok(NewAccessToken {
            access_token,
            plain_text_token,
        })
    }

    /// Resolve a plain-text token.
    ///
    /// Unknown, malformed and expired tokens all resolve to `None`.
    pub async fn find(&self, plain: &str) -> Result<Option<AccessToken>> {
        let token = match parse(plain) {
            Some(PlainToken::WithId { id, secret }) => {
                let query = format!(
                    "SELECT {TOKEN_COLUMNS} FROM personal_access_tokens WHERE id = $1"
                );
                sqlx::query_as::<_, AccessToken>(&query)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .filter(|token| {
                        constant_time_eq(
                            &token.token,
                            &self.crypto.hasher.digest(secret),
                        )
                    })
            },
            Some(PlainToken::Secret(secret)) => {
                let query = format!(
                    "SELECT {TOKEN_COLUMNS} FROM personal_access_tokens WHERE token = $1"
                );
                sqlx::query_as::<_, AccessToken>(&query)
                    .bind(self.crypto.hasher.digest(secret))
                    .fetch_optional(&self.pool)
                    .await?
            },
            None => None,
        };

        Ok(token.filter(|token| token.is_valid_at(Utc::now())))
    }

    /// Record token usage.
    pub async fn touch(&self, id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE personal_access_tokens SET last_used_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a token. It can never authenticate again.
    pub async fn revoke(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn expiry_from_now(lifetime: Duration) -> Option<DateTime<Utc>> {
    Utc::now().checked_add_signed(lifetime)
}

#[derive(Debug, PartialEq)]
enum PlainToken<'a> {
    WithId { id: i64, secret: &'a str },
    Secret(&'a str),
}

fn parse(plain: &str) -> Option<PlainToken<'_>> {
    let plain = plain.trim();
    if plain.is_empty() {
        return None;
    }

    match plain.split_once(SEPARATOR) {
        Some((id, secret)) => {
            let id = id.parse().ok()?;
            Some(PlainToken::WithId { id, secret })
        },
        None => Some(PlainToken::Secret(plain)),
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
