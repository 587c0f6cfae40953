//! Back-office order handlers.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use tracing::warn;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ConfirmOrderResponse;
use crate::services::orders;

/// `POST /api/admin/orders/{id}/confirm`: fulfil an order, activating its codes.
pub async fn confirm_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Path(order_id): Path<String>,
) -> AppResult<Json<ConfirmOrderResponse>> {
    if !claims.role().is_staff() {
        warn!(user_id = claims.id(), "non-staff order confirmation attempt");
        return Err(AppError::Unauthorized("insufficient-role-error".into()));
    }
    let resp = orders::confirm_order(&state, &order_id).await?;
    Ok(Json(resp))
}
