//! Business logic invoked by the handlers.

pub mod auth;
pub mod orders;
pub mod reviews;
