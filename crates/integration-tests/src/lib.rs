//! Integration tests for Shopfront.
//!
//! Each test starts a [`MockBackend`] (an axum router on an ephemeral port
//! standing in for the shop REST API), builds the storefront or admin app
//! against it, and drives the app in process with a cookie-carrying
//! [`TestClient`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_checkout` - Login and OTP-confirmed checkout
//! - `admin_console` - Admin login, product validation, confirmed deletes

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::Request,
    http::{Method, StatusCode, header},
    middleware::{Next, from_fn},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

// =============================================================================
// Mock backend
// =============================================================================

/// One request the mock backend received.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    pub path: String,
    pub body: String,
}

/// The shop REST API, faked with an axum router on a local port.
pub struct MockBackend {
    pub url: Url,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl MockBackend {
    /// Serve `routes` on an ephemeral port, recording every request.
    pub async fn start(routes: Router) -> Self {
        let hits: Arc<Mutex<Vec<Hit>>> = Arc::default();
        let recorder = Arc::clone(&hits);

        let app = routes.layer(from_fn(move |request: Request, next: Next| {
            let recorder = Arc::clone(&recorder);
            async move {
                let (parts, body) = request.into_parts();
                let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
                recorder.lock().unwrap().push(Hit {
                    method: parts.method.clone(),
                    path: parts.uri.path().to_string(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
                next.run(Request::from_parts(parts, Body::from(bytes))).await
            }
        }));

        let listener = tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
            hits,
        }
    }

    /// Everything received so far.
    #[must_use]
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    /// Whether `method path` was requested.
    #[must_use]
    pub fn was_called(&self, method: &Method, path: &str) -> bool {
        self.hits()
            .iter()
            .any(|hit| &hit.method == method && hit.path == path)
    }

    /// Requests with any method other than GET.
    #[must_use]
    pub fn writes(&self) -> Vec<Hit> {
        self.hits()
            .into_iter()
            .filter(|hit| hit.method != Method::GET)
            .collect()
    }
}

/// `{"status": "success", "data": data}`
pub fn success(data: Value) -> Response {
    Json(json!({ "status": "success", "data": data })).into_response()
}

/// `{"status": "error", "message": message}` with `status`.
pub fn failure(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "status": "error", "message": message })),
    )
        .into_response()
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn customer_json() -> Value {
    json!({"_id": "u1", "name": "Ada Buyer", "email": "ada@shop.test", "role": "customer"})
}

pub fn admin_json() -> Value {
    json!({"_id": "a1", "name": "Grace Admin", "email": "grace@shop.test", "role": "admin"})
}

pub fn login_json(user: &Value) -> Value {
    json!({ "token": "token-for-tests", "user": user })
}

pub fn clothing_json() -> Value {
    json!({
        "_id": "c1",
        "name": "Clothing",
        "attributes": [
            {"name": "Fabric", "type": "select", "options": ["Cotton", "Linen"], "required": true}
        ]
    })
}

pub fn tee_json() -> Value {
    json!({
        "_id": "p1",
        "name": "Linen Tee",
        "price": "25.00",
        "stock": 5,
        "category_id": "c1",
        "variants": [{"size": "S", "stock": 2}, {"size": "M", "stock": 3}],
        "attributes": [{"name": "Fabric", "value": "Linen"}]
    })
}

// =============================================================================
// Apps under test
// =============================================================================

const BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

/// A clock tests move forward by hand.
#[derive(Clone)]
pub struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl Default for TestClock {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Utc::now())))
    }
}

impl TestClock {
    pub fn advance_secs(&self, secs: i64) {
        *self.0.lock().unwrap() += ChronoDuration::seconds(secs);
    }

    fn clock(&self) -> shopfront_storefront::state::Clock {
        let now = Arc::clone(&self.0);
        Arc::new(move || *now.lock().unwrap())
    }
}

/// Storefront router talking to `backend`.
pub fn storefront_app(backend: &MockBackend) -> Router {
    let state = shopfront_storefront::state::AppState::new(storefront_config(backend)).unwrap();
    shopfront_storefront::app(state)
}

/// Storefront router whose checkout windows follow `clock`.
pub fn storefront_app_with_clock(backend: &MockBackend, clock: &TestClock) -> Router {
    let state = shopfront_storefront::state::AppState::with_clock(
        storefront_config(backend),
        clock.clock(),
    )
    .unwrap();
    shopfront_storefront::app(state)
}

fn storefront_config(backend: &MockBackend) -> shopfront_storefront::config::StorefrontConfig {
    use shopfront_storefront::config::{BackendConfig, StorefrontConfig};

    StorefrontConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("integration-test-session-secret-0123456789abcdef"),
        rate_limit: false,
        backend: BackendConfig {
            api_url: backend.url.clone(),
            timeout: BACKEND_TIMEOUT,
        },
        currency_symbol: "$".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        log_json: false,
    }
}

/// Admin router talking to `backend`.
pub fn admin_app(backend: &MockBackend) -> Router {
    use shopfront_admin::config::{AdminConfig, BackendConfig};

    let config = AdminConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        session_secret: SecretString::from("integration-test-admin-secret-0123456789abcdef"),
        backend: BackendConfig {
            api_url: backend.url.clone(),
            timeout: BACKEND_TIMEOUT,
        },
        currency_symbol: "$".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        log_json: false,
        tls: None,
    };
    let state = shopfront_admin::state::AppState::new(config).unwrap();
    shopfront_admin::app(state)
}

// =============================================================================
// Client
// =============================================================================

/// A response with its body read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    #[must_use]
    pub fn is_redirect_to(&self, path: &str) -> bool {
        self.status == StatusCode::SEE_OTHER && self.location.as_deref() == Some(path)
    }
}

/// Sends requests straight into a router, keeping cookies between them.
pub struct TestClient {
    app: Router,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    #[must_use]
    pub const fn new(app: Router) -> Self {
        Self {
            app,
            cookies: BTreeMap::new(),
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.builder(Method::GET, path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .builder(Method::POST, path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// GET the page a redirect points at.
    pub async fn follow(&mut self, response: &TestResponse) -> TestResponse {
        let location = response.location.clone().unwrap();
        self.get(&location).await
    }

    fn builder(&self, method: Method, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        if self.cookies.is_empty() {
            return builder;
        }
        let cookie = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder.header(header::COOKIE, cookie)
    }

    async fn send(&mut self, request: Request) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let Some(pair) = value.to_str().ok().and_then(|v| v.split(';').next()) else {
                continue;
            };
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
