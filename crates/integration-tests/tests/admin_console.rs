//! Admin console flows against a mock backend.

#![allow(clippy::unwrap_used)]

use axum::{
    Json, Router,
    extract::Path,
    http::{Method, StatusCode},
    response::Response,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use shopfront_integration_tests::{
    MockBackend, TestClient, admin_app, admin_json, clothing_json, customer_json, login_json,
    success, tee_json,
};

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == "grace@shop.test" {
        success(login_json(&admin_json()))
    } else {
        success(login_json(&customer_json()))
    }
}

fn admin_backend() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/products", get(|| async { success(json!([tee_json()])) }))
        .route(
            "/products/{id}",
            get(|Path(_id): Path<String>| async { success(tee_json()) }),
        )
        .route("/categories", get(|| async { success(json!([clothing_json()])) }))
        .route(
            "/admin/products",
            post(|| async { success(json!({"_id": "p2"})) }),
        )
        .route(
            "/admin/products/{id}",
            delete(|Path(_id): Path<String>| async { success(Value::Null) }),
        )
        .route(
            "/admin/users",
            get(|| async { success(json!([admin_json(), customer_json()])) }),
        )
        .route(
            "/admin/users/{id}",
            delete(|Path(_id): Path<String>| async { success(Value::Null) }),
        )
}

async fn signed_in_admin(backend: &MockBackend) -> TestClient {
    let mut client = TestClient::new(admin_app(backend));
    let response = client
        .post_form(
            "/auth/login",
            &[("email", "grace@shop.test"), ("password", "correct-password")],
        )
        .await;
    assert!(response.is_redirect_to("/"), "{response:?}");
    client
}

fn product_form<'a>(stock: &'a str, variants: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    let mut fields = vec![
        ("name", "Linen Shirt"),
        ("description", "Breathable"),
        ("price", "40"),
        ("stock", stock),
        ("category_id", "c1"),
        ("images", ""),
        ("attr_name", "Fabric"),
        ("attr_value", "Linen"),
    ];
    for (size, size_stock) in variants {
        fields.push(("variant_size", size));
        fields.push(("variant_stock", size_stock));
    }
    fields
}

#[tokio::test]
async fn test_console_requires_login() {
    let backend = MockBackend::start(admin_backend()).await;
    let mut client = TestClient::new(admin_app(&backend));

    let response = client.get("/products?stock=out_of_stock").await;
    assert!(
        response.is_redirect_to("/auth/login?next=%2Fproducts%3Fstock%3Dout_of_stock"),
        "{response:?}"
    );
    assert!(backend.hits().is_empty());

    // Signing in from there lands back on the filtered table.
    let response = client
        .post_form(
            "/auth/login",
            &[
                ("email", "grace@shop.test"),
                ("password", "correct-password"),
                ("next", "/products?stock=out_of_stock"),
            ],
        )
        .await;
    assert!(
        response.is_redirect_to("/products?stock=out_of_stock"),
        "{response:?}"
    );
}

#[tokio::test]
async fn test_non_admin_cannot_sign_in() {
    let backend = MockBackend::start(admin_backend()).await;
    let mut client = TestClient::new(admin_app(&backend));

    let response = client
        .post_form(
            "/auth/login",
            &[("email", "ada@shop.test"), ("password", "correct-password")],
        )
        .await;
    assert!(response.is_redirect_to("/auth/login"), "{response:?}");

    let page = client.follow(&response).await;
    assert!(page.body.contains("This account does not have admin access."));

    let response = client.get("/").await;
    assert!(response.is_redirect_to("/auth/login"));
}

#[tokio::test]
async fn test_admin_sees_product_table() {
    let backend = MockBackend::start(admin_backend()).await;
    let mut client = signed_in_admin(&backend).await;

    let page = client.get("/products").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Linen Tee"));
    assert!(page.body.contains("S (2), M (3)"));
}

#[tokio::test]
async fn test_variant_stock_mismatch_is_rejected_without_saving() {
    let backend = MockBackend::start(admin_backend()).await;
    let mut client = signed_in_admin(&backend).await;

    let response = client
        .post_form("/products", &product_form("10", &[("S", "2"), ("M", "3")]))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .body
            .contains("Variant stock adds up to 5 but product stock is 10")
    );
    // The entered values survive the round trip.
    assert!(response.body.contains("Linen Shirt"));
    assert!(!backend.was_called(&Method::POST, "/admin/products"));
}

#[tokio::test]
async fn test_valid_product_is_saved() {
    let backend = MockBackend::start(admin_backend()).await;
    let mut client = signed_in_admin(&backend).await;

    let response = client
        .post_form("/products", &product_form("5", &[("S", "2"), ("M", "3")]))
        .await;
    assert!(response.is_redirect_to("/products"), "{response:?}");

    let saved = backend
        .hits()
        .into_iter()
        .find(|hit| hit.method == Method::POST && hit.path == "/admin/products")
        .unwrap();
    let body: Value = serde_json::from_str(&saved.body).unwrap();
    assert_eq!(body["name"], "Linen Shirt");
    assert_eq!(body["stock"], 5);
    assert_eq!(body["category_id"], "c1");
    assert_eq!(body["variants"].as_array().unwrap().len(), 2);
    assert_eq!(body["attributes"][0]["value"], "Linen");
}

#[tokio::test]
async fn test_delete_without_confirmation_sends_nothing() {
    let backend = MockBackend::start(admin_backend()).await;
    let mut client = signed_in_admin(&backend).await;

    let confirm_page = client.get("/products/p1/delete").await;
    assert_eq!(confirm_page.status, StatusCode::OK);
    assert!(confirm_page.body.contains("Linen Tee"));

    let response = client.post_form("/products/p1/delete", &[]).await;
    assert!(response.is_redirect_to("/products"), "{response:?}");
    assert!(!backend.was_called(&Method::DELETE, "/admin/products/p1"));

    let response = client
        .post_form("/products/p1/delete", &[("confirm", "yes")])
        .await;
    assert!(response.is_redirect_to("/products"), "{response:?}");
    assert!(backend.was_called(&Method::DELETE, "/admin/products/p1"));
}

#[tokio::test]
async fn test_admin_cannot_delete_own_account() {
    let backend = MockBackend::start(admin_backend()).await;
    let mut client = signed_in_admin(&backend).await;

    let response = client
        .post_form("/users/a1/delete", &[("confirm", "yes")])
        .await;
    assert!(response.is_redirect_to("/users"), "{response:?}");
    assert!(!backend.was_called(&Method::DELETE, "/admin/users/a1"));
}

#[tokio::test]
async fn test_user_delete_requires_confirmation() {
    let backend = MockBackend::start(admin_backend()).await;
    let mut client = signed_in_admin(&backend).await;

    let confirm_page = client.get("/users/u1/delete").await;
    assert_eq!(confirm_page.status, StatusCode::OK);
    assert!(confirm_page.body.contains("ada@shop.test"));

    let response = client.post_form("/users/u1/delete", &[]).await;
    assert!(response.is_redirect_to("/users"), "{response:?}");
    let page = client.follow(&response).await;
    assert!(page.body.contains("Deletion was not confirmed."));
    assert!(!backend.was_called(&Method::DELETE, "/admin/users/u1"));

    let response = client
        .post_form("/users/u1/delete", &[("confirm", "yes")])
        .await;
    assert!(response.is_redirect_to("/users"), "{response:?}");
    assert!(backend.was_called(&Method::DELETE, "/admin/users/u1"));
}
