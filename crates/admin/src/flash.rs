//! Toast notifications carried across a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

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

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            ToastKind::Success => "toast--success",
            ToastKind::Error => "toast--error",
        }
    }

    #[must_use]
    pub const fn role(&self) -> &'static str {
        match self.kind {
            ToastKind::Error => "alert",
            ToastKind::Success => "status",
        }
    }
}

async fn push(session: &Session, toast: Toast) {
    let mut pending: Vec<Toast> = session
        .get(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(toast);
    if let Err(e) = session.insert(session_keys::TOASTS, &pending).await {
        tracing::error!(error = %e, "Failed to store toast in session");
    }
}

pub async fn success(session: &Session, message: impl Into<String>) {
    push(session, Toast::new(ToastKind::Success, message)).await;
}

pub async fn error(session: &Session, message: impl Into<String>) {
    push(session, Toast::new(ToastKind::Error, message)).await;
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

    #[tokio::test]
    async fn test_take_drains_queue() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        success(&session, "Product saved").await;
        error(&session, "Backend unavailable").await;

        let toasts = take(&session).await;
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].css_class(), "toast--success");
        assert_eq!(toasts[1].role(), "alert");
        assert!(take(&session).await.is_empty());
    }
}
