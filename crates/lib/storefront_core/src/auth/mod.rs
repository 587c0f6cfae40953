//! Authentication building blocks.
//!
//! Session tokens, password hashing and policy, and the credential store
//! shared by the HTTP layer and the operator CLI.

pub mod identities;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod queries;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
