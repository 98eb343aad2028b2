//! Storefront login and OTP-confirmed checkout against a mock backend.

#![allow(clippy::unwrap_used)]

use axum::{
    Json, Router,
    http::{Method, StatusCode},
    response::Response,
    routing::{get, post},
};
use serde_json::{Value, json};
use shopfront_integration_tests::{
    MockBackend, TestClient, TestClock, customer_json, failure, login_json, storefront_app,
    storefront_app_with_clock, success,
};

const GOOD_CODE: &str = "123456";

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == "correct-password" {
        success(login_json(&customer_json()))
    } else {
        failure(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn verify_otp(Json(body): Json<Value>) -> Response {
    if body["otp"] == GOOD_CODE {
        success(Value::Null)
    } else {
        failure(StatusCode::BAD_REQUEST, "Invalid OTP")
    }
}

fn shop_backend() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route(
            "/cart",
            get(|| async {
                success(json!({
                    "items": [{"product_id": "p1", "name": "Linen Tee", "price": "25.00", "quantity": 2}]
                }))
            }),
        )
        .route(
            "/users/me/addresses",
            get(|| async {
                success(json!([{
                    "_id": "addr1", "full_name": "Ada Buyer", "phone": "5550100",
                    "line1": "1 Main St", "city": "Springfield", "state": "IL",
                    "postal_code": "62701", "country": "US", "is_default": true
                }]))
            }),
        )
        .route(
            "/orders/generate-otp",
            post(|| async { success(json!({"sent": true})) }),
        )
        .route("/orders/verify-otp", post(verify_otp))
        .route(
            "/orders",
            post(|| async { success(json!({"_id": "o1", "total": "50.00", "status": "pending"})) }),
        )
}

async fn signed_in_client(backend: &MockBackend) -> TestClient {
    sign_in(TestClient::new(storefront_app(backend))).await
}

async fn sign_in(mut client: TestClient) -> TestClient {
    let response = client
        .post_form(
            "/auth/login",
            &[("email", "ada@shop.test"), ("password", "correct-password")],
        )
        .await;
    assert!(response.is_redirect_to("/account"), "{response:?}");
    client
}

async fn start_checkout(client: &mut TestClient) {
    start_checkout_paying(client, "cash_on_delivery").await;
}

async fn start_checkout_paying(client: &mut TestClient, payment_method: &str) {
    let response = client
        .post_form(
            "/checkout",
            &[("address_id", "addr1"), ("payment_method", payment_method)],
        )
        .await;
    assert!(response.is_redirect_to("/checkout/verify"), "{response:?}");
}

fn codes_issued(backend: &MockBackend) -> usize {
    backend
        .hits()
        .iter()
        .filter(|hit| hit.method == Method::POST && hit.path == "/orders/generate-otp")
        .count()
}

#[tokio::test]
async fn test_login_with_bad_password_stays_logged_out() {
    let backend = MockBackend::start(shop_backend()).await;
    let mut client = TestClient::new(storefront_app(&backend));

    let response = client
        .post_form(
            "/auth/login",
            &[("email", "ada@shop.test"), ("password", "wrong")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(response.location.as_deref().unwrap().starts_with("/auth/login"));

    let page = client.follow(&response).await;
    assert!(page.body.contains("Invalid email or password."));

    // Still anonymous: checkout bounces to login.
    let response = client.get("/checkout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(response.location.as_deref().unwrap().starts_with("/auth/login"));
}

#[tokio::test]
async fn test_checkout_places_order_after_code_is_verified() {
    let backend = MockBackend::start(shop_backend()).await;
    let mut client = signed_in_client(&backend).await;

    start_checkout(&mut client).await;
    assert!(backend.was_called(&Method::POST, "/orders/generate-otp"));
    assert!(!backend.was_called(&Method::POST, "/orders"));

    let verify_page = client.get("/checkout/verify").await;
    assert_eq!(verify_page.status, StatusCode::OK);

    let response = client.post_form("/checkout/verify", &[("otp", GOOD_CODE)]).await;
    assert!(response.is_redirect_to("/orders/o1/confirmation"), "{response:?}");

    let writes: Vec<String> = backend
        .writes()
        .into_iter()
        .map(|hit| format!("{} {}", hit.method, hit.path))
        .collect();
    assert_eq!(
        writes,
        vec![
            "POST /auth/login",
            "POST /orders/generate-otp",
            "POST /orders/verify-otp",
            "POST /orders",
        ]
    );
    let order = backend
        .hits()
        .into_iter()
        .find(|hit| hit.method == Method::POST && hit.path == "/orders")
        .unwrap();
    let body: Value = serde_json::from_str(&order.body).unwrap();
    assert_eq!(body["address_id"], "addr1");
    assert_eq!(body["payment_method"], "cash_on_delivery");

    // The checkout entry is gone once the order exists.
    let response = client.get("/checkout/verify").await;
    assert!(response.is_redirect_to("/checkout"), "{response:?}");
}

#[tokio::test]
async fn test_rejected_code_never_places_order() {
    let backend = MockBackend::start(shop_backend()).await;
    let mut client = signed_in_client(&backend).await;
    start_checkout(&mut client).await;

    let response = client.post_form("/checkout/verify", &[("otp", "000000")]).await;
    assert!(response.is_redirect_to("/checkout/verify"), "{response:?}");

    assert!(backend.was_called(&Method::POST, "/orders/verify-otp"));
    assert!(!backend.was_called(&Method::POST, "/orders"));
}

#[tokio::test]
async fn test_malformed_code_is_not_sent_to_backend() {
    let backend = MockBackend::start(shop_backend()).await;
    let mut client = signed_in_client(&backend).await;
    start_checkout(&mut client).await;

    let response = client.post_form("/checkout/verify", &[("otp", "12ab")]).await;
    assert!(response.is_redirect_to("/checkout/verify"), "{response:?}");

    assert!(!backend.was_called(&Method::POST, "/orders/verify-otp"));
    assert!(!backend.was_called(&Method::POST, "/orders"));
}

#[tokio::test]
async fn test_resend_waits_for_first_minute() {
    let backend = MockBackend::start(shop_backend()).await;
    let clock = TestClock::default();
    let mut client = sign_in(TestClient::new(storefront_app_with_clock(&backend, &clock))).await;
    start_checkout(&mut client).await;

    clock.advance_secs(10);
    let response = client.post_form("/checkout/resend", &[]).await;
    assert!(response.is_redirect_to("/checkout/verify"), "{response:?}");
    let page = client.follow(&response).await;
    assert!(page.body.contains("You can request a new code in 50 seconds"));
    assert_eq!(codes_issued(&backend), 1);

    clock.advance_secs(51);
    let response = client.post_form("/checkout/resend", &[]).await;
    assert!(response.is_redirect_to("/checkout/verify"), "{response:?}");
    assert_eq!(codes_issued(&backend), 2);
}

#[tokio::test]
async fn test_changing_details_inside_first_minute_keeps_the_code() {
    let backend = MockBackend::start(shop_backend()).await;
    let clock = TestClock::default();
    let mut client = sign_in(TestClient::new(storefront_app_with_clock(&backend, &clock))).await;
    start_checkout(&mut client).await;

    clock.advance_secs(5);
    start_checkout_paying(&mut client, "online").await;
    assert_eq!(codes_issued(&backend), 1);

    let response = client.post_form("/checkout/verify", &[("otp", GOOD_CODE)]).await;
    assert!(response.is_redirect_to("/orders/o1/confirmation"), "{response:?}");
    let order = backend
        .hits()
        .into_iter()
        .find(|hit| hit.method == Method::POST && hit.path == "/orders")
        .unwrap();
    let body: Value = serde_json::from_str(&order.body).unwrap();
    assert_eq!(body["payment_method"], "online");

    // Once the lock has passed, starting over issues a fresh code.
    clock.advance_secs(60);
    start_checkout(&mut client).await;
    assert_eq!(codes_issued(&backend), 2);
}

#[tokio::test]
async fn test_code_entered_after_window_closes_is_refused() {
    let backend = MockBackend::start(shop_backend()).await;
    let clock = TestClock::default();
    let mut client = sign_in(TestClient::new(storefront_app_with_clock(&backend, &clock))).await;
    start_checkout(&mut client).await;

    clock.advance_secs(601);
    let response = client.post_form("/checkout/verify", &[("otp", GOOD_CODE)]).await;
    assert!(response.is_redirect_to("/checkout/verify"), "{response:?}");
    let page = client.follow(&response).await;
    assert!(page.body.contains("The code has expired"));

    assert!(!backend.was_called(&Method::POST, "/orders/verify-otp"));
    assert!(!backend.was_called(&Method::POST, "/orders"));
}
