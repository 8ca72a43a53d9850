//! Middlewares for routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::ServerError;
use crate::error::Result;
use crate::token::AccessToken;
use crate::user::{User, UserBuilder};

const BEARER: &str = "bearer ";

/// Caller resolved from its bearer token.
#[derive(Clone, Debug)]
pub struct Authenticated {
    pub user: User,
    pub token: AccessToken,
}

/// Extract token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_at_checked(BEARER.len())?;

    if !scheme.eq_ignore_ascii_case(BEARER) {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

/// Custom middleware for authentification.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(req.headers()).ok_or(ServerError::Unauthorized)?;

    let Some(token) = state.token.find(&token).await? else {
        tracing::debug!("unknown or expired bearer token");
        return Err(ServerError::Unauthorized);
    };

    let Some(user) = UserBuilder::new()
        .id(token.user_id)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .find_by_id()
        .await?
    else {
        return Err(ServerError::Unauthorized);
    };

    state.token.touch(token.id).await?;

    req.extensions_mut().insert(Authenticated {
        user: user.data,
        token,
    });
    Ok(next.run(req).await)
}
