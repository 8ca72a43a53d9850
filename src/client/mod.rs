//! Client side of the authentication flow.
//!
//! [`ApiClient`] talks to the HTTP API with the bearer token kept in a
//! [`TokenStore`]. [`AuthSession`] holds the signed-in user and drives
//! navigation after login, register and logout.

pub mod nav;
pub mod notice;
mod session;
mod storage;

pub use session::{AuthSession, History, Navigator, Route};
pub use storage::{FileStore, MemoryStore, TOKEN_KEY, TokenStore};

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::error::ResponseError;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Enum representing client-side errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("token storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("server returned {status}")]
    Api {
        status: StatusCode,
        body: Option<ResponseError>,
    },
}

impl ClientError {
    /// `message` sent back by the API, if any.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            ClientError::Api {
                body: Some(body), ..
            } if !body.message.is_empty() => Some(&body.message),
            _ => None,
        }
    }
}

/// User as seen by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Registration form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegisterData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// HTTP client for the authentication API.
#[derive(Clone, Debug)]
pub struct ApiClient<S> {
    http: reqwest::Client,
    base: Url,
    store: S,
}

impl<S: TokenStore> ApiClient<S> {
    /// Create a new [`ApiClient`] targeting `base_url`.
    pub fn new(base_url: &str, store: S) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("hris/", env!("CARGO_PKG_VERSION")))
            .timeout(TIMEOUT)
            .build()?;

        Ok(Self { http, base, store })
    }

    /// Storage holding the bearer token.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self.base.join(path.trim_start_matches('/'))?;
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");

        if let Some(token) = self.store.get(TOKEN_KEY) {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        Ok(request)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.json::<ResponseError>().await.ok();
            tracing::debug!(%status, "api request rejected");
            return Err(ClientError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// `POST /api/login`. Returns the issued token.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let request = self
            .request(Method::POST, "api/login")?
            .json(&Credentials { email, password });
        let body: TokenResponse = self.send(request).await?;
        Ok(body.token)
    }

    /// `POST /api/register`. Returns the issued token.
    pub async fn register(
        &self,
        data: &RegisterData,
    ) -> Result<String, ClientError> {
        let request = self.request(Method::POST, "api/register")?.json(data);
        let body: TokenResponse = self.send(request).await?;
        Ok(body.token)
    }

    /// `POST /api/logout`.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let request = self.request(Method::POST, "api/logout")?;
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }

    /// `GET /api/user`.
    pub async fn user(&self) -> Result<User, ClientError> {
        let request = self.request(Method::GET, "api/user")?;
        self.send(request).await
    }
}

/// Serve the application on a random local port.
#[cfg(test)]
pub(crate) async fn spawn_server(pool: sqlx::Pool<sqlx::Postgres>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = crate::app(crate::router::state(pool));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}
