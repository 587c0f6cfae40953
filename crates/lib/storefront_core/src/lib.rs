//! # storefront_core
//!
//! Core domain logic for the storefront: identities and session tokens,
//! virtual (gift-card) codes, orders and reviews.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod orders;
pub mod reviews;
pub mod store;
pub mod uuid;
pub mod vcode;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
