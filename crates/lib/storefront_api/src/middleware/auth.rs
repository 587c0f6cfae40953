//! Auth gate: Bearer token extraction and session-token verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use storefront_core::auth::jwt::{decode_token, extract_token_from_header, is_token_expired};
use storefront_core::models::claims::TokenClaims;

use crate::AppState;
use crate::error::AppError;

/// Verified claims, present in request extensions behind [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

/// Claims if the caller presented a valid token; inserted by [`optional_auth`].
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<TokenClaims>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(TokenClaims::id)
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_token_from_header(header)
}

/// Verify the request's bearer token, naming the reason on failure.
pub(crate) fn authenticate(state: &AppState, request: &Request) -> Result<TokenClaims, AppError> {
    let token = bearer_token(request)
        .ok_or_else(|| AppError::Unauthenticated("token-missing".into()))?;
    state
        .tokens
        .verify_token(token)
        .ok_or_else(|| AppError::Unauthenticated(rejection_code(token).into()))
}

/// Message code for a token that failed verification. Expiry only picks the
/// wording; a token that does not even decode is `invalid-token`.
pub(crate) fn rejection_code(token: &str) -> &'static str {
    if decode_token(token).is_some() && is_token_expired(token) {
        "token-expired"
    } else {
        "invalid-token"
    }
}

/// Axum middleware: rejects the request unless it carries a valid
/// `Authorization: Bearer <token>`, then injects [`AuthenticatedUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &request)?;
    request.extensions_mut().insert(AuthenticatedUser(claims));
    Ok(next.run(request).await)
}

/// Axum middleware: never rejects. Injects [`MaybeUser`] with the claims of a
/// valid token, or `None`.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = bearer_token(&request).and_then(|token| state.tokens.verify_token(token));
    request.extensions_mut().insert(MaybeUser(claims));
    next.run(request).await
}
