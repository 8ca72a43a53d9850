//! HTTP API.
pub mod login;
pub mod logout;
pub mod register;
pub mod status;
pub mod user;

use axum::extract::{FromRequest, Request};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ServerError;
use crate::user::User;
use crate::AppState;

/// Body returned by login and register.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Rules spanning several fields, checked after field validation.
pub trait Rules: Validate {
    /// Fields in the order their rules are declared.
    const FIELDS: &'static [&'static str] = &[];

    fn rules(&self, _errors: &mut ValidationErrors) {}
}

/// JSON body extractor running [`Validate`] and [`Rules`].
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Rules,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;

        let mut errors =
            value.validate().err().unwrap_or_else(ValidationErrors::new);
        value.rules(&mut errors);

        if errors.is_empty() {
            Ok(Valid(value))
        } else {
            Err(ServerError::Form {
                errors,
                fields: T::FIELDS,
            })
        }
    }
}

/// Reject strings made only of whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }

    Ok(())
}

/// Routes mounted under `/api`.
pub fn api(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // `POST /api/logout` goes to `logout`. Authorization required.
        .route("/logout", post(logout::handler))
        // `GET /api/user` goes to `user`. Authorization required.
        .route("/user", get(user::handler))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::authenticate,
        ));

    Router::new()
        // `POST /api/login` goes to `login`.
        .route("/login", post(login::handler))
        // `POST /api/register` goes to `register`.
        .route("/register", post(register::handler))
        .merge(protected)
}

/// State backed by a test pool, with cheap Argon2 parameters.
#[cfg(test)]
pub fn state(pool: sqlx::Pool<sqlx::Postgres>) -> AppState {
    use std::sync::Arc;

    let argon2 = crate::config::Argon2 {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    };
    let config = Arc::new(crate::config::Configuration::default());
    let crypto = Arc::new(
        crate::crypto::Crypto::new(Some(argon2), &config.token.pepper)
            .unwrap(),
    );

    AppState {
        token: crate::token::TokenManager::new(pool.clone(), Arc::clone(&crypto))
            .expiration(config.token.expiration)
            .unwrap(),
        db: crate::database::Database { postgres: pool },
        config,
        crypto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Jane").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }
}
