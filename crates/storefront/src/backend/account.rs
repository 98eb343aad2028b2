//! Auth and profile endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use shopfront_core::{AccessToken, Address, AddressId, AddressInput, Email, User};
use tracing::instrument;

use super::{BackendClient, BackendError, segment};

/// `data` of a successful `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: AccessToken,
    pub user: User,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    otp: &'a str,
    password: &'a str,
}

/// Body of `PUT /users/me`.
#[derive(Debug, Serialize)]
pub struct ProfileUpdate<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

impl BackendClient {
    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a token (`POST /auth/login`).
    ///
    /// # Errors
    ///
    /// Returns an error carrying the backend's message for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<LoginResponse, BackendError> {
        let builder = self
            .request(Method::POST, "auth/login", None)?
            .json(&LoginRequest {
                email: email.as_str(),
                password,
            });
        self.fetch(builder).await
    }

    /// Create an account (`POST /auth/register`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "auth/register", None)?
            .json(request);
        self.send(builder).await
    }

    /// Ask the backend to email a password-reset code (`POST /auth/forgot-password`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &Email) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "auth/forgot-password", None)?
            .json(&ForgotPasswordRequest {
                email: email.as_str(),
            });
        self.send(builder).await
    }

    /// Set a new password using the emailed code (`POST /auth/reset-password`).
    ///
    /// # Errors
    ///
    /// Returns an error if the code is wrong or expired.
    #[instrument(skip(self, otp, password), fields(email = %email))]
    pub async fn reset_password(
        &self,
        email: &Email,
        otp: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "auth/reset-password", None)?
            .json(&ResetPasswordRequest {
                email: email.as_str(),
                otp,
                password,
            });
        self.send(builder).await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// The signed-in user (`GET /users/me`).
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn get_profile(&self, token: &AccessToken) -> Result<User, BackendError> {
        self.fetch(self.request(Method::GET, "users/me", Some(token))?)
            .await
    }

    /// Update name and phone (`PUT /users/me`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token))]
    pub async fn update_profile(
        &self,
        token: &AccessToken,
        update: &ProfileUpdate<'_>,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::PUT, "users/me", Some(token))?
            .json(update);
        self.send(builder).await
    }

    /// Saved addresses (`GET /users/me/addresses`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_addresses(&self, token: &AccessToken) -> Result<Vec<Address>, BackendError> {
        self.fetch(self.request(Method::GET, "users/me/addresses", Some(token))?)
            .await
    }

    /// Add an address (`POST /users/me/addresses`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self, token, input))]
    pub async fn create_address(
        &self,
        token: &AccessToken,
        input: &AddressInput,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "users/me/addresses", Some(token))?
            .json(input);
        self.send(builder).await
    }

    /// Replace an address (`PUT /users/me/addresses/{id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        token: &AccessToken,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<(), BackendError> {
        let path = format!("users/me/addresses/{}", segment(id.as_str()));
        let builder = self.request(Method::PUT, &path, Some(token))?.json(input);
        self.send(builder).await
    }

    /// Remove an address (`DELETE /users/me/addresses/{id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    #[instrument(skip(self, token), fields(address_id = %id))]
    pub async fn delete_address(
        &self,
        token: &AccessToken,
        id: &AddressId,
    ) -> Result<(), BackendError> {
        let path = format!("users/me/addresses/{}", segment(id.as_str()));
        self.send(self.request(Method::DELETE, &path, Some(token))?)
            .await
    }
}
