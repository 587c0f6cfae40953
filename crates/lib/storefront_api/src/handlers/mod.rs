//! Request handlers.

pub mod admin_auth;
pub mod admin_orders;
pub mod auth;
pub mod health;
pub mod orders;
pub mod reviews;
pub mod users;
pub mod virtual_codes;
