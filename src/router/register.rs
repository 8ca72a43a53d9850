//! Create an account and hand out its first token.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::Result;
use crate::router::{AuthResponse, Rules, Valid};
use crate::telemetry::record_auth;
use crate::user::UserBuilder;

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        required(message = "The name field is required."),
        length(
            max = 255,
            message = "The name field must not be greater than 255 characters."
        ),
        custom(
            function = "crate::router::not_blank",
            message = "The name field is required."
        )
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address."),
        length(
            max = 255,
            message = "The email field must not be greater than 255 characters."
        )
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "The password field is required."),
        length(
            min = 8,
            message = "The password field must be at least 8 characters."
        ),
        custom(
            function = "crate::router::not_blank",
            message = "The password field is required."
        )
    )]
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl Rules for Body {
    const FIELDS: &'static [&'static str] = &["name", "email", "password"];

    fn rules(&self, errors: &mut ValidationErrors) {
        if self.password.is_some()
            && self.password != self.password_confirmation
        {
            errors.add(
                "password",
                ValidationError::new("confirmed").with_message(
                    "The password field confirmation does not match.".into(),
                ),
            );
        }
    }
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let user = UserBuilder::new()
        .email(body.email.unwrap_or_default())
        .name(body.name.unwrap_or_default())
        .password(body.password.unwrap_or_default())
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .create_user()
        .await
        .inspect_err(|_| record_auth("register", "rejected"))?;

    let token = user
        .create_token(&state.token, &state.config.token.name)
        .await?;

    record_auth("register", "accepted");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: token.plain_text_token,
            user: user.data,
        }),
    ))
}
