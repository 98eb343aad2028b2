//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//!
//! # Catalog
//! GET  /products                      - Product listing (filters, 12 per page)
//! GET  /products/{id}                 - Product detail with reviews
//! POST /products/{id}/reviews         - Post a review (auth)
//!
//! # Cart (auth)
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add to cart
//!
//! # Checkout (auth)
//! GET  /checkout                      - Choose address and payment
//! POST /checkout                      - Issue OTP, start the window
//! GET  /checkout/verify               - OTP entry with countdown
//! POST /checkout/verify               - Verify OTP, then place order
//! POST /checkout/resend               - Issue a new OTP
//! GET  /orders/{id}/confirmation      - Order placed
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action
//! GET  /auth/register                 - Register page
//! POST /auth/register                 - Register action
//! POST /auth/logout                   - Logout action
//! GET  /auth/forgot-password          - Request reset code
//! POST /auth/forgot-password          - Send reset code
//! GET  /auth/reset-password           - Reset form
//! POST /auth/reset-password           - Set new password
//!
//! # Account (auth)
//! GET  /account                       - Profile
//! POST /account/profile               - Update profile
//! GET  /account/orders                - Order history
//! GET  /account/orders/{id}           - Order detail
//! GET  /account/addresses             - Address list
//! GET  /account/addresses/new         - New address form
//! POST /account/addresses             - Create address
//! GET  /account/addresses/{id}/edit   - Edit address form
//! POST /account/addresses/{id}        - Update address
//! GET  /account/addresses/{id}/delete - Confirm delete
//! POST /account/addresses/{id}/delete - Delete (requires confirm field)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::backend::BackendError;
use crate::flash;
use crate::middleware::{auth_rate_limiter, clear_current_user};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Credential posts are rate limited when `rate_limit` is set.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let credential_posts = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password));
    let credential_posts = if rate_limit {
        credential_posts.layer(auth_rate_limiter())
    } else {
        credential_posts
    };

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/forgot-password", get(auth::forgot_password_page))
        .route("/reset-password", get(auth::reset_password_page))
        .route("/logout", post(auth::logout))
        .merge(credential_posts)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", post(products::submit_review))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::start))
        .route("/verify", get(checkout::verify_page).post(checkout::verify))
        .route("/resend", post(checkout::resend))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/new", get(account::new_address))
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/edit", get(account::edit_address))
        .route(
            "/addresses/{id}/delete",
            get(account::confirm_delete_address).post(account::delete_address),
        )
}

/// Create all routes for the storefront.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/orders/{id}/confirmation", get(orders::confirmation))
        .nest("/account", account_routes())
        .nest("/auth", auth_routes(rate_limit))
}

// =============================================================================
// Shared handler helpers
// =============================================================================

/// Log the customer out after the backend rejected their token.
pub async fn session_expired(session: &Session) -> Response {
    if let Err(e) = clear_current_user(session).await {
        tracing::error!(error = %e, "Failed to clear session after 401");
    }
    crate::error::clear_sentry_user();
    flash::error(session, crate::backend::SESSION_EXPIRED_MESSAGE).await;
    Redirect::to("/auth/login").into_response()
}

/// Surface a failed backend call as a toast and redirect.
///
/// A 401 logs the customer out instead.
pub async fn fail(session: &Session, err: &BackendError, redirect_to: &str) -> Response {
    if matches!(err, BackendError::Unauthorized) {
        return session_expired(session).await;
    }
    if err.is_server_fault() {
        tracing::error!(error = %err, "Backend call failed");
    } else {
        tracing::debug!(error = %err, "Backend rejected request");
    }
    flash::error(session, err.user_message()).await;
    Redirect::to(redirect_to).into_response()
}

/// Redirect with a success toast.
pub async fn done(session: &Session, message: &str, redirect_to: &str) -> Response {
    flash::success(session, message).await;
    Redirect::to(redirect_to).into_response()
}

/// Redirect with an error toast that did not come from the backend.
pub async fn reject(session: &Session, message: &str, redirect_to: &str) -> Response {
    flash::error(session, message).await;
    Redirect::to(redirect_to).into_response()
}
