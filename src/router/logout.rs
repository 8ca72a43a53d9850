//! Revoke the token used by the current request.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::middleware::Authenticated;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub message: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Authenticated>,
) -> Result<Json<Response>> {
    state.token.revoke(caller.token.id).await?;

    tracing::info!(
        user_id = caller.user.id,
        token_id = caller.token.id,
        "user logged out"
    );

    Ok(Json(Response {
        message: "Logged out successfully".into(),
    }))
}
