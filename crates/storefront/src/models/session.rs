//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use serde::{Deserialize, Serialize};

use shopfront_core::checkout::OtpCheckout;
use shopfront_core::{AccessToken, AddressId, Email, PaymentMethod, User, UserId, UserRole};

/// Session-stored user identity.
///
/// Holds the backend bearer token; `Debug` output of the token is redacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub token: AccessToken,
}

impl CurrentUser {
    /// Build from a login response.
    #[must_use]
    pub fn new(user: User, token: AccessToken) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }

    /// First word of the name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Checkout in progress: what is being ordered and where the OTP stands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub otp: OtpCheckout,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending toast notifications.
    pub const TOASTS: &str = "toasts";

    /// Key for the checkout in progress.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the email a password-reset code was sent to.
    pub const RESET_EMAIL: &str = "reset_email";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let user = CurrentUser {
            id: UserId::new("u1"),
            name: "Asha Rao".to_string(),
            email: Email::parse("asha@shop.test").unwrap(),
            role: UserRole::Customer,
            token: AccessToken::new("t"),
        };
        assert_eq!(user.first_name(), "Asha");
    }

    #[test]
    fn test_current_user_debug_hides_token() {
        let user = CurrentUser {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: Email::parse("asha@shop.test").unwrap(),
            role: UserRole::Customer,
            token: AccessToken::new("very-secret-token"),
        };
        assert!(!format!("{user:?}").contains("very-secret-token"));
    }
}
