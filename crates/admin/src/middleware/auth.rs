//! Authentication extractors for admin.
//!
//! The console session holds the admin's backend token. Pages opened without
//! one send the browser to the login page, which returns it to the page it
//! came from once an admin signs in.

use axum::{
    extract::FromRequestParts,
    http::{Method, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Where the login page lives.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires a signed-in admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Why a request needing an admin was turned away.
pub enum AdminAuthRejection {
    /// Nobody is signed in; carries the login URL to send them to.
    RedirectToLogin(String),
    /// No session layer on the request.
    MissingSession,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(to) => Redirect::to(&to).into_response(),
            Self::MissingSession => {
                tracing::error!("Admin route reached without a session layer");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::MissingSession)?;

        match session_admin(session).await {
            Some(admin) => Ok(Self(admin)),
            None => Err(AdminAuthRejection::RedirectToLogin(login_redirect(
                return_path(parts),
            ))),
        }
    }
}

/// Extractor for pages that work with or without a signed-in admin.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session_admin(session).await,
            None => None,
        };
        Ok(Self(admin))
    }
}

async fn session_admin(session: &Session) -> Option<CurrentAdmin> {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
}

/// The page to come back to after logging in.
///
/// Only GETs are worth returning to; a form post lands back on the dashboard.
fn return_path(parts: &Parts) -> &str {
    if parts.method != Method::GET {
        return "/";
    }
    parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
}

/// Login URL that returns to `next` afterwards.
#[must_use]
pub fn login_redirect(next: &str) -> String {
    if next == "/" {
        LOGIN_PATH.to_string()
    } else {
        format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
    }
}

/// `next` if it is a path on this site, otherwise the dashboard.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Store the signed-in admin, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Remove the admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(method: Method, uri: &str) -> Parts {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_get_returns_to_page_with_filters() {
        let parts = parts(Method::GET, "/products?stock=out_of_stock");
        assert_eq!(
            login_redirect(return_path(&parts)),
            "/auth/login?next=%2Fproducts%3Fstock%3Dout_of_stock"
        );
    }

    #[test]
    fn test_posts_and_dashboard_use_plain_login() {
        assert_eq!(login_redirect(return_path(&parts(Method::POST, "/products"))), "/auth/login");
        assert_eq!(login_redirect(return_path(&parts(Method::GET, "/"))), "/auth/login");
    }

    #[test]
    fn test_safe_next_stays_on_site() {
        assert_eq!(safe_next(Some("/users?role=admin")), "/users?role=admin");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
