//! Core types for Shopfront.
//!
//! Entities are owned by the backend; these are the shapes we decode them
//! into and render from.

pub mod account;
pub mod catalog;
pub mod email;
pub mod id;
pub mod money;
pub mod order;

pub use account::{AccessToken, Address, AddressInput, User, UserRole};
pub use catalog::{
    AttributeDefinition, AttributeKind, Category, Product, ProductAttribute, Review, Variant,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use order::{Cart, CartItem, Order, OrderItem, OrderStatus, PaymentMethod};
