//! Per-request layout data.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::flash::{self, Toast, ToastKind};
use crate::models::{CurrentAdmin, session_keys};

/// Layout context: signed-in admin, pending toasts and the current path
/// (for highlighting the sidebar).
pub struct PageContext {
    pub admin: Option<CurrentAdmin>,
    pub toasts: Vec<Toast>,
    pub current_path: String,
    session: Option<Session>,
}

impl PageContext {
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast::new(ToastKind::Error, message));
    }

    /// Redirect, carrying any pending toasts over to the next page.
    pub async fn redirect(self, to: &str) -> Response {
        if let Some(session) = &self.session {
            for toast in self.toasts {
                match toast.kind {
                    ToastKind::Success => flash::success(session, toast.message).await,
                    ToastKind::Error => flash::error(session, toast.message).await,
                }
            }
        }
        Redirect::to(to).into_response()
    }

    /// Whether the sidebar entry for `section` is the current one.
    #[must_use]
    pub fn is_active(&self, section: &str) -> bool {
        if section == "/" {
            self.current_path == "/"
        } else {
            self.current_path == section
                || self
                    .current_path
                    .strip_prefix(section)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current_path = parts.uri.path().to_string();

        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self {
                admin: None,
                toasts: Vec::new(),
                current_path,
                session: None,
            });
        };

        let admin = session
            .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten();
        let toasts = flash::take(&session).await;

        Ok(Self {
            admin,
            toasts,
            current_path,
            session: Some(session),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(path: &str) -> PageContext {
        PageContext {
            admin: None,
            toasts: Vec::new(),
            current_path: path.to_string(),
            session: None,
        }
    }

    #[test]
    fn test_is_active_matches_section_prefix() {
        assert!(at("/products/p1/edit").is_active("/products"));
        assert!(at("/products").is_active("/products"));
        assert!(!at("/products-archive").is_active("/products"));
        assert!(!at("/users").is_active("/"));
        assert!(at("/").is_active("/"));
    }
}
