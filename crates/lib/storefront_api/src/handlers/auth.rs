//! Customer authentication handlers.

use axum::extract::State;
use axum::{Extension, Json};
use storefront_core::models::identity::Realm;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest,
};
use crate::services::auth;

/// `POST /api/auth/register`: create a customer account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth::register_customer(
        state.stores.identities.as_ref(),
        &state.tokens,
        &body.name,
        &body.email,
        &body.password,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/auth/login`: authenticate a customer with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth::login(
        state.stores.identities.as_ref(),
        &state.tokens,
        Realm::Customer,
        &body.email,
        &body.password,
        state.config.disclose_login_failure_reason,
    )
    .await?;
    Ok(Json(resp))
}

/// `GET /api/auth/user`: reload the caller and reissue their token.
pub async fn current_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth::current_user(state.stores.identities.as_ref(), &state.tokens, &claims).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/reset-password`: set a new password using a reset token.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = auth::reset_customer_password(
        state.stores.identities.as_ref(),
        &state.tokens,
        &body.token,
        &body.new_password,
    )
    .await?;
    Ok(Json(resp))
}
