//! Back-office authentication handlers.

use axum::Json;
use axum::extract::State;
use storefront_core::models::identity::Realm;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest,
};
use crate::services::auth;

/// `POST /api/admin/auth/register`: bootstrap the single Owner account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth::register_owner(
        state.stores.identities.as_ref(),
        &state.tokens,
        &body.name,
        &body.email,
        &body.password,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/admin/auth/login`
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = auth::login(
        state.stores.identities.as_ref(),
        &state.tokens,
        Realm::Admin,
        &body.email,
        &body.password,
        state.config.disclose_login_failure_reason,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /api/admin/auth/reset-password`
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = auth::reset_admin_password(
        state.stores.identities.as_ref(),
        &state.tokens,
        &body.token,
        &body.new_password,
    )
    .await?;
    Ok(Json(resp))
}
