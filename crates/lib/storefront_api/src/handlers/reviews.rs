//! Review handlers.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::{AuthenticatedUser, MaybeUser};
use crate::models::{CreateReviewRequest, CreateReviewResponse, ReviewListResponse};
use crate::services::reviews;

/// `POST /api/reviews`: one review per product per author.
pub async fn create_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Json(body): Json<CreateReviewRequest>,
) -> AppResult<Json<CreateReviewResponse>> {
    let resp = reviews::create_review(&state, &claims, body).await?;
    Ok(Json(resp))
}

/// `GET /api/products/{id}/reviews`: newest first, own reviews flagged.
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<MaybeUser>,
    Path(product_id): Path<String>,
) -> AppResult<Json<ReviewListResponse>> {
    let resp = reviews::list_reviews(&state, &product_id, caller.id()).await?;
    Ok(Json(resp))
}
