//! The backend response envelope.
//!
//! Every backend endpoint answers with `{"status": "...", "data": ...}` on
//! success or `{"status": "...", "message": "..."}` otherwise. Only the
//! literal status `"success"` counts as success.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when a failure carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors produced while unwrapping an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The backend answered with a non-success status.
    #[error("{0}")]
    Rejected(String),
    /// Success was reported but the expected `data` field was absent.
    #[error("response is missing data")]
    MissingData,
}

impl EnvelopeError {
    /// Text suitable for a toast.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Rejected(message) => message,
            Self::MissingData => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// `{status, data | message}` as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Build a success envelope (used by tests and mock backends).
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: None,
        }
    }

    /// Build a failure envelope carrying a message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Unwrap the `data` field.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] with the backend message (or the
    /// generic fallback) when the status is not `"success"`, and
    /// [`EnvelopeError::MissingData`] when `data` is absent.
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        if !self.is_success() {
            return Err(EnvelopeError::Rejected(failure_message(self.message)));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }

    /// Check the status and discard any payload.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] when the status is not `"success"`.
    pub fn into_unit(self) -> Result<(), EnvelopeError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(EnvelopeError::Rejected(failure_message(self.message)))
        }
    }
}

/// The backend message if it has any content, otherwise the generic fallback.
#[must_use]
pub fn failure_message(message: Option<String>) -> String {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn decode(value: Value) -> ApiEnvelope<Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_success_yields_data() {
        let env = decode(json!({"status": "success", "data": {"id": 1}}));
        assert_eq!(env.into_data().unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_non_success_yields_backend_message() {
        let env = decode(json!({"status": "fail", "message": "Invalid OTP"}));
        assert_eq!(
            env.into_data(),
            Err(EnvelopeError::Rejected("Invalid OTP".to_string()))
        );
    }

    #[test]
    fn test_non_success_without_message_uses_fallback() {
        let env = decode(json!({"status": "error", "message": "  "}));
        let err = env.into_unit().unwrap_err();
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_success_without_data_is_an_error_only_when_data_is_expected() {
        let env = decode(json!({"status": "success", "message": "OTP sent"}));
        assert!(env.clone().into_unit().is_ok());
        assert_eq!(env.into_data(), Err(EnvelopeError::MissingData));
    }

    #[test]
    fn test_status_match_is_exact() {
        let env = decode(json!({"status": "Success", "data": 1}));
        assert!(!env.is_success());
    }
}
