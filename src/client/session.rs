//! Authentication session.

use std::fmt;

use super::{ApiClient, ClientError, RegisterData, TOKEN_KEY, TokenStore, User};

/// Client-side pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/auth/login",
            Route::Register => "/auth/register",
            Route::Dashboard => "/dashboard",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Something able to move the user to another page.
pub trait Navigator {
    fn push(&mut self, route: Route);
}

/// Navigator remembering every visited route.
#[derive(Clone, Debug, Default)]
pub struct History {
    pub routes: Vec<Route>,
}

impl History {
    /// Last visited route.
    pub fn current(&self) -> Option<Route> {
        self.routes.last().copied()
    }
}

impl Navigator for History {
    fn push(&mut self, route: Route) {
        self.routes.push(route);
    }
}

/// Signed-in user and the actions changing it.
pub struct AuthSession<S, N> {
    api: ApiClient<S>,
    navigator: N,
    user: Option<User>,
    is_loading: bool,
}

impl<S: TokenStore, N: Navigator> AuthSession<S, N> {
    /// Create a new session. It stays loading until [`Self::check_auth`].
    pub fn new(api: ApiClient<S>, navigator: N) -> Self {
        Self {
            api,
            navigator,
            user: None,
            is_loading: true,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn api(&self) -> &ApiClient<S> {
        &self.api
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Load the current user. Any failure drops the stored token.
    pub async fn check_auth(&mut self) {
        match self.api.user().await {
            Ok(user) => self.user = Some(user),
            Err(err) => {
                tracing::debug!(%err, "session is not authenticated");
                self.user = None;
                self.forget_token();
            },
        }

        self.is_loading = false;
    }

    /// Log in, then go to the dashboard.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let token = self.api.login(email, password).await?;
        self.start(&token).await
    }

    /// Create an account, then go to the dashboard.
    pub async fn register(
        &mut self,
        data: &RegisterData,
    ) -> Result<(), ClientError> {
        let token = self.api.register(data).await?;
        self.start(&token).await
    }

    /// Log out, then go to the landing page.
    ///
    /// Local state is cleared even when the API call fails.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let result = self.api.logout().await;

        self.forget_token();
        self.user = None;
        self.navigator.push(Route::Landing);

        result
    }

    async fn start(&mut self, token: &str) -> Result<(), ClientError> {
        self.api.store().set(TOKEN_KEY, token)?;
        self.check_auth().await;
        self.navigator.push(Route::Dashboard);
        Ok(())
    }

    fn forget_token(&self) {
        if let Err(err) = self.api.store().remove(TOKEN_KEY) {
            tracing::warn!(%err, "failed to remove stored token");
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::client::{MemoryStore, spawn_server};

    const TOKEN: &str = "1|fixturetokensecret0000000000000000000000";

    async fn session(pool: Pool<Postgres>) -> AuthSession<MemoryStore, History> {
        let base = spawn_server(pool).await;
        let api = ApiClient::new(&base, MemoryStore::default()).unwrap();
        AuthSession::new(api, History::default())
    }

    fn register_data(email: &str) -> RegisterData {
        RegisterData {
            name: "Jane Doe".into(),
            email: email.into(),
            password: "password123".into(),
            password_confirmation: "password123".into(),
        }
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Landing.to_string(), "/");
        assert_eq!(Route::Login.path(), "/auth/login");
        assert_eq!(Route::Register.path(), "/auth/register");
        assert_eq!(Route::Dashboard.path(), "/dashboard");
    }

    #[sqlx::test]
    async fn test_register_then_login(pool: Pool<Postgres>) {
        let mut session = session(pool).await;
        assert!(session.is_loading());

        session
            .register(&register_data("jane@hris.test"))
            .await
            .unwrap();
        assert!(!session.is_loading());
        assert_eq!(session.user().unwrap().email, "jane@hris.test");
        assert!(session.api().store().get(TOKEN_KEY).is_some());
        assert_eq!(session.navigator().current(), Some(Route::Dashboard));

        session.logout().await.unwrap();
        session.login("jane@hris.test", "password123").await.unwrap();
        assert_eq!(session.user().unwrap().name, "Jane Doe");
        assert_eq!(
            session.navigator().routes,
            vec![Route::Dashboard, Route::Landing, Route::Dashboard]
        );
    }

    #[sqlx::test]
    async fn test_failed_login_keeps_state(pool: Pool<Postgres>) {
        let mut session = session(pool).await;

        let err = session
            .login("ghost@hris.test", "password123")
            .await
            .unwrap_err();
        assert_eq!(
            err.api_message(),
            Some("The provided credentials are incorrect.")
        );
        assert!(session.user().is_none());
        assert!(session.api().store().get(TOKEN_KEY).is_none());
        assert!(session.navigator().routes.is_empty());
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_duplicate_register_is_rejected(pool: Pool<Postgres>) {
        let mut session = session(pool).await;

        let err = session
            .register(&register_data("admin@hris.test"))
            .await
            .unwrap_err();
        assert_eq!(err.api_message(), Some("The email has already been taken."));
        assert!(session.navigator().routes.is_empty());
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_logout_clears_token(pool: Pool<Postgres>) {
        let mut session = session(pool).await;
        session.api().store().set(TOKEN_KEY, TOKEN).unwrap();

        session.check_auth().await;
        assert_eq!(session.user().unwrap().id, 1);

        session.logout().await.unwrap();
        assert!(session.user().is_none());
        assert!(session.api().store().get(TOKEN_KEY).is_none());
        assert_eq!(session.navigator().current(), Some(Route::Landing));
    }

    #[sqlx::test]
    async fn test_logout_clears_token_when_api_fails(pool: Pool<Postgres>) {
        let mut session = session(pool).await;
        session.api().store().set(TOKEN_KEY, "1|revoked").unwrap();

        assert!(session.logout().await.is_err());
        assert!(session.api().store().get(TOKEN_KEY).is_none());
        assert_eq!(session.navigator().current(), Some(Route::Landing));
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_check_auth_drops_invalid_token(pool: Pool<Postgres>) {
        let mut session = session(pool).await;
        session
            .api()
            .store()
            .set(TOKEN_KEY, "2|expiredtokensecret0000000000000000000000")
            .unwrap();

        session.check_auth().await;
        assert!(!session.is_loading());
        assert!(session.user().is_none());
        assert!(session.api().store().get(TOKEN_KEY).is_none());
    }
}
