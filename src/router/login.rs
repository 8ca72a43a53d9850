//! Exchange email and password for a bearer token.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::AppState;
use crate::error::{Result, field_error};
use crate::router::{AuthResponse, Rules, Valid};
use crate::telemetry::record_auth;
use crate::user::UserBuilder;

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "The password field is required."),
        custom(
            function = "crate::router::not_blank",
            message = "The password field is required."
        )
    )]
    pub password: Option<String>,
}

impl Rules for Body {
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

fn invalid_credentials() -> ValidationErrors {
    field_error(
        "email",
        "credentials",
        "The provided credentials are incorrect.",
    )
}

/// Handler to log user in.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<AuthResponse>> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let user = UserBuilder::new()
        .email(&email)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .find_by_email()
        .await?
        .filter(|user| user.verify_password(&password));

    let Some(user) = user else {
        record_auth("login", "rejected");
        tracing::debug!("login rejected, invalid credentials");
        return Err(invalid_credentials().into());
    };

    let token = user
        .create_token(&state.token, &state.config.token.name)
        .await?;

    record_auth("login", "accepted");
    tracing::info!(user_id = user.data.id, "user logged in");

    Ok(Json(AuthResponse {
        token: token.plain_text_token,
        user: user.data,
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::error::ResponseError;
    use crate::*;

    pub(crate) const EMAIL: &str = "jane.doe@hris.test";
    pub(crate) const PASSWORD: &str = "correct-horse-battery";

    /// Register a user through the API and return its token.
    pub(crate) async fn register(app: axum::Router) -> AuthResponse {
        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/register",
            json!({
                "name": "Jane Doe",
                "email": EMAIL,
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[sqlx::test]
    async fn test_login_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let registered = register(app.clone()).await;

        let req_body = Body {
            email: Some("Jane.Doe@HRIS.test".into()),
            password: Some(PASSWORD.into()),
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/login",
            json!(req_body).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: AuthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.user.id, registered.user.id);
        assert_eq!(body.user.email, EMAIL);
        assert_ne!(body.token, registered.token);

        // Both tokens are usable.
        assert!(state.token.find(&body.token).await.unwrap().is_some());
        assert!(state.token.find(&registered.token).await.unwrap().is_some());
    }

    #[sqlx::test]
    async fn test_login_with_wrong_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);
        register(app.clone()).await;

        let req_body = Body {
            email: Some(EMAIL.into()),
            password: Some("wrong-password".into()),
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/login",
            json!(req_body).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResponseError = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.message, "The provided credentials are incorrect.");
        assert!(body.errors.unwrap().contains_key("email"));
    }

    #[sqlx::test]
    async fn test_login_with_unknown_email(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        let req_body = Body {
            email: Some("ghost@hris.test".into()),
            password: Some(PASSWORD.into()),
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/login",
            json!(req_body).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResponseError = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.message, "The provided credentials are incorrect.");
    }

    #[sqlx::test]
    async fn test_login_missing_fields(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/login",
            json!({ "email": "not-an-email" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResponseError = serde_json::from_slice(&body).unwrap();
        let errors = body.errors.unwrap();
        assert_eq!(
            errors["email"],
            vec!["The email field must be a valid email address.".to_string()]
        );
        assert_eq!(
            errors["password"],
            vec!["The password field is required.".to_string()]
        );
    }
}
