//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use shopfront_core::{AccessToken, Email, User, UserId};

/// Session-stored admin identity.
///
/// Only users the backend reports with the admin role get one. The bearer
/// token is redacted from `Debug` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub token: AccessToken,
}

impl CurrentAdmin {
    /// Build from a login response, or `None` if the user is not an admin.
    #[must_use]
    pub fn from_login(user: User, token: AccessToken) -> Option<Self> {
        user.is_admin().then(|| Self {
            id: user.id,
            email: user.email,
            name: user.name,
            token,
        })
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for pending toast notifications.
    pub const TOASTS: &str = "toasts";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::UserRole;

    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new("u1"),
            name: "Asha Rao".to_string(),
            email: Email::parse("asha@shop.test").unwrap(),
            phone: None,
            role,
            created_at: None,
        }
    }

    #[test]
    fn test_customers_cannot_become_admins() {
        assert!(CurrentAdmin::from_login(user(UserRole::Customer), AccessToken::new("t")).is_none());
    }

    #[test]
    fn test_admin_login_keeps_token() {
        let admin = CurrentAdmin::from_login(user(UserRole::Admin), AccessToken::new("tok")).unwrap();
        assert_eq!(admin.token.expose(), "tok");
        assert_eq!(admin.name, "Asha Rao");
    }
}
