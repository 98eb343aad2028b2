//! Toast notifications carried across a redirect.
//!
//! Form handlers push a toast into the session and redirect; the next page
//! rendered through [`crate::page::PageContext`] takes and displays them.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    #[must_use]
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// CSS modifier class used by the layout.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            ToastKind::Success => "toast--success",
            ToastKind::Error => "toast--error",
            ToastKind::Info => "toast--info",
        }
    }

    /// ARIA role: errors interrupt, everything else is polite.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        match self.kind {
            ToastKind::Error => "alert",
            ToastKind::Success | ToastKind::Info => "status",
        }
    }
}

/// Queue toasts for the next rendered page.
///
/// Session failures are logged and the toast is dropped.
pub async fn push_all(session: &Session, toasts: Vec<Toast>) {
    if toasts.is_empty() {
        return;
    }
    let mut pending: Vec<Toast> = session
        .get(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.extend(toasts);
    if let Err(e) = session.insert(session_keys::TOASTS, &pending).await {
        tracing::error!(error = %e, "Failed to store toast in session");
    }
}

pub async fn push(session: &Session, toast: Toast) {
    push_all(session, vec![toast]).await;
}

pub async fn success(session: &Session, message: impl Into<String>) {
    push(session, Toast::new(ToastKind::Success, message)).await;
}

pub async fn error(session: &Session, message: impl Into<String>) {
    push(session, Toast::new(ToastKind::Error, message)).await;
}

pub async fn info(session: &Session, message: impl Into<String>) {
    push(session, Toast::new(ToastKind::Info, message)).await;
}

/// Remove and return all pending toasts.
pub async fn take(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(session_keys::TOASTS).await {
        Ok(toasts) => toasts.unwrap_or_default(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read toasts from session");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_toasts_are_taken_once_in_order() {
        let session = session();
        success(&session, "Saved").await;
        error(&session, "Out of stock").await;

        let toasts = take(&session).await;
        assert_eq!(
            toasts,
            vec![
                Toast::new(ToastKind::Success, "Saved"),
                Toast::new(ToastKind::Error, "Out of stock"),
            ]
        );
        assert!(take(&session).await.is_empty());
    }

    #[test]
    fn test_error_toast_is_an_alert() {
        let toast = Toast::new(ToastKind::Error, "x");
        assert_eq!(toast.role(), "alert");
        assert_eq!(toast.css_class(), "toast--error");
    }
}
