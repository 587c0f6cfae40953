//! Order and virtual-code handlers for the purchasing customer.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{CodeListResponse, CreateOrderRequest, CreateOrderResponse, RetrievalResponse};
use crate::services::orders;

/// Header carrying the caller's retrieval idempotency key.
pub const IDEMPOTENCY_KEY: &str = "idempotency-key";

/// `POST /api/orders`: place an order; virtual lines get pending codes.
pub async fn create_order_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Json(body): Json<CreateOrderRequest>,
) -> AppResult<Json<CreateOrderResponse>> {
    let resp = orders::place_order(&state, &claims, body.items).await?;
    Ok(Json(resp))
}

/// `GET /api/orders/{id}/virtual-codes`: codes with status, never plaintext.
pub async fn list_codes_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Path(order_id): Path<String>,
) -> AppResult<Json<CodeListResponse>> {
    let resp = orders::list_codes(&state, &claims, &order_id).await?;
    Ok(Json(resp))
}

/// `POST /api/orders/{id}/virtual-codes/{codeId}/retrieve`: disclose and
/// consume an active code.
pub async fn retrieve_code_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Path((order_id, code_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> AppResult<Json<RetrievalResponse>> {
    let key = headers
        .get(IDEMPOTENCY_KEY)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty());
    let resp = orders::retrieve_code(&state, &claims, &order_id, &code_id, key).await?;
    Ok(Json(resp))
}
