//! Admin login and user management.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use shopfront_core::{AccessToken, Email, User, UserId, UserRole};
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

/// Body of `POST /admin/users` and `PUT /admin/users/{id}`.
///
/// `password` is required on create and optional on update, where leaving
/// it out keeps the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInput {
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl BackendClient {
    /// Exchange credentials for a token (`POST /auth/login`).
    ///
    /// The caller decides whether the returned user may use the console.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for bad credentials, or an error if the request fails.
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

    /// All users (`GET /admin/users`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_users(&self, token: &AccessToken) -> Result<Vec<User>, BackendError> {
        self.fetch(self.request(Method::GET, "admin/users", Some(token))?)
            .await
    }

    /// `POST /admin/users`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the user.
    #[instrument(skip(self, token, input), fields(email = %input.email))]
    pub async fn create_user(
        &self,
        token: &AccessToken,
        input: &UserInput,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "admin/users", Some(token))?
            .json(input);
        self.send(builder).await
    }

    /// `PUT /admin/users/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(user_id = %id))]
    pub async fn update_user(
        &self,
        token: &AccessToken,
        id: &UserId,
        input: &UserInput,
    ) -> Result<(), BackendError> {
        let path = format!("admin/users/{}", segment(id.as_str()));
        let builder = self.request(Method::PUT, &path, Some(token))?.json(input);
        self.send(builder).await
    }

    /// `DELETE /admin/users/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_user(&self, token: &AccessToken, id: &UserId) -> Result<(), BackendError> {
        let path = format!("admin/users/{}", segment(id.as_str()));
        self.send(self.request(Method::DELETE, &path, Some(token))?)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_input_omits_blank_password() {
        let input = UserInput {
            name: "Ben".to_string(),
            email: Email::parse("ben@shop.test").unwrap(),
            phone: None,
            role: UserRole::Customer,
            password: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Ben", "email": "ben@shop.test", "role": "customer"})
        );
    }
}
