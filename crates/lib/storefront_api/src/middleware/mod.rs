//! Request middleware.

pub mod auth;
pub mod route_policy;
