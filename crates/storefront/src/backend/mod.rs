//! Client for the shop backend REST API.
//!
//! # Architecture
//!
//! - The backend is the source of truth for catalog, carts, orders and
//!   accounts. Nothing is persisted locally.
//! - Every response is a `{status, data | message}` envelope; anything other
//!   than `status == "success"` becomes a [`BackendError`].
//! - Public catalog reads are cached in-process with `moka` (60 second TTL).
//! - Calls made on behalf of a customer carry `Authorization: Bearer <token>`.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = BackendClient::new(&config.backend)?;
//!
//! let products = client.list_products().await?;
//! let session = client.login(&email, &password).await?;
//! let cart = client.get_cart(&session.token).await?;
//! ```

mod account;
mod cache;
mod catalog;
mod orders;

pub use account::{LoginResponse, ProfileUpdate, RegisterRequest};
pub use orders::{CheckoutGateway, PlaceOrderRequest};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shopfront_core::envelope::failure_message;
use shopfront_core::{AccessToken, ApiEnvelope, EnvelopeError, GENERIC_FAILURE_MESSAGE};
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

use cache::{CacheKey, CacheValue};

/// How long public catalog reads are cached.
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(60);

/// Shown when the backend rejects the customer's token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("Backend returned {status}: {}", message.as_deref().unwrap_or("(no message)"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// HTTP success but `status != "success"` in the envelope.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The bearer token was missing, expired or revoked.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An endpoint path could not be joined onto the base URL.
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
    /// Text suitable for a toast: the backend's own message when it sent
    /// one, otherwise the generic fallback.
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

    /// Whether the failure is on our side of the wire or the backend's,
    /// rather than a rejected request.
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
/// Cheap to clone; the HTTP connection pool and cache are shared.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
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
            .user_agent(concat!("shopfront-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CATALOG_CACHE_TTL)
            .build();

        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url,
                cache,
            }),
        })
    }

    /// Resolve an endpoint path (without leading slash) against the base URL.
    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Start a request, attaching the bearer token when given.
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

    /// Send a request and decode the envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, BackendError> {
        let response = builder.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
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

    /// Send a request and return its `data`.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        Ok(self.execute::<T>(builder).await?.into_data()?)
    }

    /// Send a request that returns no payload we need.
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

/// Percent-encode an id for use as a single path segment.
fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(&BackendConfig {
            api_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = client("http://backend.test/api/v1");
        assert_eq!(
            client.url("products").unwrap().as_str(),
            "http://backend.test/api/v1/products"
        );
        assert_eq!(
            client.url("/orders/verify-otp").unwrap().as_str(),
            "http://backend.test/api/v1/orders/verify-otp"
        );
    }

    #[test]
    fn test_segment_escapes_slashes() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = BackendError::Rejected("Invalid OTP".to_string());
        assert_eq!(err.user_message(), "Invalid OTP");

        let err = BackendError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Email already registered".to_string()),
        };
        assert_eq!(err.user_message(), "Email already registered");
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        let err = BackendError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert!(err.is_server_fault());

        let err = BackendError::Parse(serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_envelope_error_conversion() {
        let err = BackendError::from(EnvelopeError::MissingData);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert!(!err.is_server_fault());
    }

    #[test]
    fn test_unauthorized_message() {
        assert_eq!(
            BackendError::Unauthorized.user_message(),
            SESSION_EXPIRED_MESSAGE
        );
    }
}
