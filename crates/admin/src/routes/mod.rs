//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Dashboard overview
//!
//! # Auth (admin role required)
//! GET  /auth/login                  - Login page
//! POST /auth/login                  - Login action
//! POST /auth/logout                 - Logout
//!
//! # Products
//! GET  /products                    - Product table (text/category/stock filters)
//! GET  /products/new                - New product form (?category= loads attributes)
//! POST /products                    - Create product
//! GET  /products/{id}/edit          - Edit product form
//! POST /products/{id}               - Update product
//! GET  /products/{id}/delete        - Confirm delete
//! POST /products/{id}/delete        - Delete (requires confirm field)
//!
//! # Categories
//! GET  /categories                  - Category table (text filter)
//! GET  /categories/new              - New category form
//! POST /categories                  - Create category
//! GET  /categories/{id}/edit        - Edit category form
//! POST /categories/{id}             - Update category
//! GET  /categories/{id}/delete      - Confirm delete
//! POST /categories/{id}/delete      - Delete (requires confirm field)
//!
//! # Users
//! GET  /users                       - User table (text/role filters)
//! GET  /users/new                   - New user form
//! POST /users                       - Create user
//! GET  /users/{id}/edit             - Edit user form
//! POST /users/{id}                  - Update user
//! GET  /users/{id}/delete           - Confirm delete
//! POST /users/{id}/delete           - Delete (requires confirm field)
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod products;
pub mod users;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::backend::BackendError;
use crate::filters;
use crate::flash;
use crate::middleware::clear_current_admin;
use crate::page::PageContext;
use crate::state::AppState;

/// Create all routes for the admin console.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(users::router())
}

// =============================================================================
// Delete confirmation
// =============================================================================

/// Confirmation page shown before any delete.
///
/// Cancelling is a plain link back to the list, so it sends nothing.
#[derive(Template, WebTemplate)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub page: PageContext,
    /// e.g. "product"
    pub kind: &'static str,
    pub subject: String,
    pub warning: Option<String>,
    pub action: String,
    pub cancel_url: String,
}

/// Body of a delete POST.
///
/// The confirmation page's submit button sends `confirm=yes`; anything else
/// is treated as not confirmed.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

impl DeleteForm {
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("yes")
    }
}

// =============================================================================
// Form fields
// =============================================================================

/// Raw form body with repeated keys kept in order.
///
/// Variant and attribute rows arrive as parallel repeated fields
/// (`variant_size`, `variant_stock`, ...), which serde structs cannot hold.
pub struct Fields<'a>(pub &'a [(String, String)]);

impl<'a> Fields<'a> {
    /// First value for `key`, or `""`.
    #[must_use]
    pub fn get(&self, key: &str) -> &'a str {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map_or("", |(_, v)| v.as_str())
    }

    /// Every value for `key`, in submission order.
    #[must_use]
    pub fn all(&self, key: &str) -> Vec<&'a str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

// =============================================================================
// Shared handler helpers
// =============================================================================

/// Log the admin out after the backend rejected their token.
pub async fn session_expired(session: &Session) -> Response {
    if let Err(e) = clear_current_admin(session).await {
        tracing::error!(error = %e, "Failed to clear session after 401");
    }
    crate::error::clear_sentry_user();
    flash::error(session, crate::backend::SESSION_EXPIRED_MESSAGE).await;
    Redirect::to(crate::middleware::auth::LOGIN_PATH).into_response()
}

/// Surface a failed backend call as a toast and redirect.
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

/// Toast a failed page load, unless it means the login expired.
///
/// Returns the redirect to send instead of the page in that case.
pub async fn load_failed(
    session: &Session,
    page: &mut PageContext,
    err: &BackendError,
) -> Option<Response> {
    if matches!(err, BackendError::Unauthorized) {
        return Some(session_expired(session).await);
    }
    tracing::error!(error = %err, "Failed to load admin page data");
    page.push_error(err.user_message());
    None
}

/// A fetched list, or an empty one plus an error toast when the call failed.
///
/// `Err` carries the login redirect for an expired token.
pub async fn list_or_toast<T>(
    session: &Session,
    page: &mut PageContext,
    result: Result<Vec<T>, BackendError>,
) -> Result<Vec<T>, Response> {
    match result {
        Ok(items) => Ok(items),
        Err(e) => match load_failed(session, page, &e).await {
            Some(redirect) => Err(redirect),
            None => Ok(Vec::new()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_requires_yes() {
        assert!(!DeleteForm::default().confirmed());
        assert!(
            !DeleteForm {
                confirm: Some("no".to_string())
            }
            .confirmed()
        );
        assert!(
            DeleteForm {
                confirm: Some("yes".to_string())
            }
            .confirmed()
        );
    }

    #[test]
    fn test_fields_keep_repeated_values_in_order() {
        let raw = vec![
            ("variant_size".to_string(), "S".to_string()),
            ("name".to_string(), "Tee".to_string()),
            ("variant_size".to_string(), "M".to_string()),
        ];
        let fields = Fields(&raw);
        assert_eq!(fields.get("name"), "Tee");
        assert_eq!(fields.get("missing"), "");
        assert_eq!(fields.all("variant_size"), vec!["S", "M"]);
    }
}
