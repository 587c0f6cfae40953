//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storefront_core::auth::AuthError;
use storefront_core::store::{Conflict, StoreError};
use storefront_core::vcode::CodeError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// The payload is the stable code returned as `message`, except for
/// [`AppError::Internal`] whose detail is logged and never returned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Unauthenticated(m) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", m.as_str())
            }
            AppError::Unauthorized(m) => (StatusCode::FORBIDDEN, "unauthorized", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::Upstream(m) => {
                error!(detail = %m, "upstream failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_failure",
                    "service-unavailable",
                )
            }
            AppError::Internal(m) => {
                error!(detail = %m, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            success: false,
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(Conflict::Email) => AppError::Conflict("email-exist-error".into()),
            StoreError::Conflict(Conflict::Owner) => AppError::Conflict("admin-role-error".into()),
            StoreError::Conflict(Conflict::Review) => {
                AppError::Conflict("review-exist-error".into())
            }
            StoreError::Conflict(Conflict::Code) => {
                AppError::Internal("virtual code collision escaped the engine".into())
            }
            StoreError::Unavailable(msg) => AppError::Upstream(msg),
            StoreError::Corrupt(msg) => AppError::Internal(msg),
            StoreError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => {
                AppError::Unauthenticated("invalid-credentials-error".into())
            }
            AuthError::TokenError(msg) => AppError::Unauthenticated(msg),
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<CodeError> for AppError {
    fn from(e: CodeError) -> Self {
        match e {
            CodeError::NotFound => AppError::NotFound("code-not-found".into()),
            CodeError::InvalidFormat => AppError::Validation("invalid-code-format".into()),
            CodeError::NotRetrievable(status) => {
                AppError::Conflict(format!("code-{}", status.as_str()))
            }
            CodeError::AlreadyRetrieved => AppError::Conflict("code-already-used".into()),
            CodeError::Exhausted(attempts) => {
                AppError::Internal(format!("no unique code batch after {attempts} attempts"))
            }
            CodeError::Store(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use storefront_core::models::vcode::CodeStatus;

    use super::*;

    #[test]
    fn store_conflicts_carry_stable_codes() {
        let err = AppError::from(StoreError::Conflict(Conflict::Owner));
        assert!(matches!(err, AppError::Conflict(ref m) if m == "admin-role-error"));
        let err = AppError::from(StoreError::Conflict(Conflict::Email));
        assert!(matches!(err, AppError::Conflict(ref m) if m == "email-exist-error"));
    }

    #[test]
    fn unavailable_store_is_upstream_failure() {
        let err = AppError::from(StoreError::Unavailable("pool timed out".into()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn code_errors_map_to_taxonomy() {
        let used = AppError::from(CodeError::AlreadyRetrieved);
        assert!(matches!(used, AppError::Conflict(ref m) if m == "code-already-used"));
        let pending = AppError::from(CodeError::NotRetrievable(CodeStatus::Pending));
        assert!(matches!(pending, AppError::Conflict(ref m) if m == "code-pending"));
        assert_eq!(
            AppError::from(CodeError::NotFound).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
