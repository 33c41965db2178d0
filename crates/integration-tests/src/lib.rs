//! Integration test harness for Tripmate.
//!
//! [`TestApp`] runs the full router in-process over the memory store, with a
//! fixed rate table (`1 EGP = 0.9 EUR`) so localized prices are predictable.
//! Tests in `tests/` drive it request by request; `live_server.rs` instead
//! targets a running server and is ignored by default.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use tripmate_core::AccountType;
use tripmate_server::build_app;
use tripmate_server::config::ServerConfig;
use tripmate_server::db::{MemoryStore, Stores};
use tripmate_server::models::{Profile, User};
use tripmate_server::services::auth::{AuthService, Registration};
use tripmate_server::state::AppState;

/// Password used for every account the harness creates.
pub const PASSWORD: &str = "correct-horse-7";

/// Largest response body the harness reads.
const BODY_LIMIT: usize = 1024 * 1024;

/// A response with its body decoded.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// `name=value` of the session cookie, if one was set.
    pub cookie: Option<String>,
}

/// The application plus direct access to its store.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    /// Build an app over an empty memory store.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is rejected.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new() -> Self {
        let config = ServerConfig::from_lookup(|key| {
            let value = match key {
                "STORE_BACKEND" => "memory",
                "BASE_CURRENCY" => "EGP",
                "CURRENCY_PROVIDER" => "fixed",
                "CURRENCY_FIXED_RATES" => "EUR=0.9",
                _ => return None,
            };
            Some(value.to_owned())
        })
        .unwrap();

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, Stores::in_memory(store.clone())).unwrap();
        let router = build_app(state, tower_sessions::MemoryStore::default());
        Self { router, store }
    }

    /// Store operations served so far.
    #[must_use]
    pub fn store_calls(&self) -> usize {
        self.store.calls()
    }

    /// Send one request. `cookie` is replayed as the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    #[allow(clippy::unwrap_used)]
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// `GET` without a session, with one extra header.
    ///
    /// # Panics
    ///
    /// Panics if the header is not a valid header.
    #[allow(clippy::unwrap_used)]
    pub async fn get_with_header(&self, uri: &str, name: &str, value: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .header(name, value)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    #[allow(clippy::unwrap_used)]
    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned);
        let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            body,
            cookie,
        }
    }

    /// `GET` without a session.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    /// Create an accepted account directly in the store.
    ///
    /// # Panics
    ///
    /// Panics if the username is taken or invalid.
    #[allow(clippy::unwrap_used)]
    pub async fn provision(&self, username: &str, account_type: AccountType) -> User {
        AuthService::new(self.store.as_ref())
            .provision(Registration {
                username: username.to_owned(),
                email: None,
                password: PASSWORD.to_owned(),
                account_type,
                profile: Profile::default(),
            })
            .await
            .unwrap()
    }

    /// Log in and return the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the login is refused.
    #[allow(clippy::unwrap_used)]
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/auth/login",
                Some(serde_json::json!({ "username": username, "password": PASSWORD })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.cookie.unwrap()
    }

    /// Provision an account and log it in.
    pub async fn sign_in(&self, username: &str, account_type: AccountType) -> (User, String) {
        let user = self.provision(username, account_type).await;
        let cookie = self.login(username).await;
        (user, cookie)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a JSON number as `f64`.
///
/// # Panics
///
/// Panics if `value` is not a number.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn number(value: &Value) -> f64 {
    value.as_f64().unwrap()
}
