//! Per-request data every full page needs.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::flash::{self, Toast, ToastKind};
use crate::middleware::CspNonce;
use crate::models::{CurrentUser, session_keys};

/// Layout context: signed-in user, pending toasts and the CSP nonce.
///
/// Extracting it consumes the session's pending toasts. Handlers that end
/// up redirecting instead of rendering should call [`PageContext::redirect`]
/// so the toasts survive to the next page.
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub toasts: Vec<Toast>,
    pub nonce: String,
    session: Option<Session>,
}

impl PageContext {
    /// Show an error toast on the page being rendered.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast::new(ToastKind::Error, message));
    }

    /// Show an informational toast on the page being rendered.
    pub fn push_info(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast::new(ToastKind::Info, message));
    }

    /// Redirect, carrying any pending toasts over to the next page.
    pub async fn redirect(self, to: &str) -> Response {
        if let Some(session) = &self.session {
            flash::push_all(session, self.toasts).await;
        }
        Redirect::to(to).into_response()
    }

    /// Name shown in the header, if signed in.
    #[must_use]
    pub fn greeting(&self) -> Option<&str> {
        self.user.as_ref().map(CurrentUser::first_name)
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;

        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self {
                user: None,
                toasts: Vec::new(),
                nonce,
                session: None,
            });
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let toasts = flash::take(&session).await;

        Ok(Self {
            user,
            toasts,
            nonce,
            session: Some(session),
        })
    }
}
