//! Get the authenticated user.

use axum::{Extension, Json};

use crate::middleware::Authenticated;
use crate::user::User;

pub async fn handler(Extension(caller): Extension<Authenticated>) -> Json<User> {
    Json(caller.user)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::error::ResponseError;
    use crate::*;

    const TOKEN: &str = "1|fixturetokensecret0000000000000000000000";
    const EXPIRED_TOKEN: &str = "2|expiredtokensecret0000000000000000000000";

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_get_user_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response =
            make_request(Some(TOKEN), app, Method::GET, "/api/user", String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(raw.get("password").is_none());

        let body: User = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.id, 1);
        assert_eq!(body.email, "admin@hris.test");

        // Usage is recorded.
        let token = state.token.find(TOKEN).await.unwrap().unwrap();
        assert!(token.last_used_at.is_some());
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_get_user_without_token(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        let response =
            make_request(None, app, Method::GET, "/api/user", String::default()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResponseError = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.message, "Unauthenticated.");
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_get_user_with_invalid_tokens(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        for token in [EXPIRED_TOKEN, "1|wrongsecret", "999|whatever", "garbage"] {
            let response = make_request(
                Some(token),
                app.clone(),
                Method::GET,
                "/api/user",
                String::default(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{token}");
        }
    }

    #[sqlx::test]
    async fn test_get_user_after_register(pool: Pool<Postgres>) {
        let app = app(router::state(pool));
        let registered = router::login::tests::register(app.clone()).await;

        let response = make_request(
            Some(&registered.token),
            app,
            Method::GET,
            "/api/user",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: User = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, registered.user);
    }
}
