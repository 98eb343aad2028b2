//! Client for the shop backend's catalog and admin endpoints.
//!
//! Unlike the storefront client nothing is cached: admins expect to see
//! their own writes immediately. Every write carries the signed-in admin's
//! bearer token.

mod catalog;
mod users;

pub use catalog::CategoryInput;
pub use users::{LoginResponse, UserInput};

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shopfront_core::envelope::failure_message;
use shopfront_core::{AccessToken, ApiEnvelope, EnvelopeError, GENERIC_FAILURE_MESSAGE};
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

/// Shown when the backend rejects the admin's token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {}", message.as_deref().unwrap_or("(no message)"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<EnvelopeError> for BackendError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Rejected(message) => Self::Rejected(message),
            EnvelopeError::MissingData => Self::Rejected(GENERIC_FAILURE_MESSAGE.to_string()),
        }
    }
}

impl BackendError {
    /// The backend's own message when it sent one, otherwise the generic fallback.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Rejected(message) | Self::NotFound(message) => message,
            Self::Status {
                message: Some(message),
                ..
            } => message,
            Self::Unauthorized => SESSION_EXPIRED_MESSAGE,
            Self::Http(_) | Self::Parse(_) | Self::Url(_) | Self::Status { message: None, .. } => {
                GENERIC_FAILURE_MESSAGE
            }
        }
    }

    #[must_use]
    pub fn is_server_fault(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => true,
            Self::Status { status, .. } => status.is_server_error(),
            Self::Rejected(_) | Self::Unauthorized | Self::NotFound(_) => false,
        }
    }
}

/// Client for the shop backend.
///
/// Cheap to clone; the HTTP connection pool is shared.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shopfront-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(BackendClientInner { client, base_url }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&AccessToken>,
    ) -> Result<RequestBuilder, BackendError> {
        let builder = self.inner.client.request(method, self.url(path)?);
        Ok(match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.message)
                .map(|m| failure_message(Some(m)));

            if status == StatusCode::NOT_FOUND {
                return Err(BackendError::NotFound(
                    message.unwrap_or_else(|| "Not found".to_string()),
                ));
            }

            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                tracing::debug!(status = %status, message = ?message, "Backend rejected request");
            }
            return Err(BackendError::Status { status, message });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        Ok(self.execute::<T>(builder).await?.into_data()?)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(), BackendError> {
        Ok(self
            .execute::<serde_json::Value>(builder)
            .await?
            .into_unit()?)
    }

    /// Check that the backend answers its health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), BackendError> {
        let response = self.request(Method::GET, "health", None)?.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Status {
                status,
                message: None,
            })
        }
    }
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_admin_paths_join_under_base() {
        let client = BackendClient::new(&BackendConfig {
            api_url: Url::parse("http://backend.test/api").unwrap(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(
            client.url("admin/products/p%2F1").unwrap().as_str(),
            "http://backend.test/api/admin/products/p%2F1"
        );
    }

    #[test]
    fn test_not_found_shows_backend_message() {
        let err = BackendError::NotFound("Product not found".to_string());
        assert_eq!(err.user_message(), "Product not found");
        assert!(!err.is_server_fault());
    }

    #[test]
    fn test_missing_data_is_generic() {
        let err = BackendError::from(EnvelopeError::MissingData);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }
}
