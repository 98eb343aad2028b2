//! Shopfront Core - Shared types library.
//!
//! This crate provides common types used across all Shopfront components:
//! - `storefront` - Public-facing shop
//! - `admin` - Catalog and user administration console
//! - `cli` - Command-line tools against the backend API
//!
//! # Architecture
//!
//! The core crate contains only types, validation and state machines - no
//! I/O and no HTTP clients. Anything that talks to the backend lives in the
//! binaries and plugs into the traits defined here.
//!
//! # Modules
//!
//! - [`types`] - IDs, email, money and the backend entities
//! - [`envelope`] - The `{status, data | message}` response envelope
//! - [`checkout`] - OTP-confirmed checkout state machine
//! - [`product_draft`] - Admin product form validation
//! - [`listing`] - Filter predicates and in-process pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod envelope;
pub mod listing;
pub mod product_draft;
pub mod types;

pub use envelope::{ApiEnvelope, EnvelopeError, GENERIC_FAILURE_MESSAGE};
pub use types::*;
