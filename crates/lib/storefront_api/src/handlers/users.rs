//! Account handlers for signed-in users.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ChangePasswordRequest, MessageResponse, ProfileQuery, ProfileResponse};
use crate::services::{auth, orders};

/// `PUT /api/users/change-password/{id}`: only the account holder may call it.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = auth::change_password(
        state.stores.identities.as_ref(),
        &claims,
        &id,
        &body.old_password,
        &body.new_password,
    )
    .await?;
    Ok(Json(resp))
}

/// `GET /api/users/profile?page&limit`: the caller plus a page of their orders.
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Query(query): Query<ProfileQuery>,
) -> AppResult<Json<ProfileResponse>> {
    let resp = orders::profile(&state, &claims, query.page, query.limit).await?;
    Ok(Json(resp))
}
