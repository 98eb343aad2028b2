//! Session models for the storefront.

pub mod session;

pub use session::{CheckoutSession, CurrentUser, keys as session_keys};
