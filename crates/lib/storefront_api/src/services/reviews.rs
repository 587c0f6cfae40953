//! Product reviews.

use storefront_core::models::claims::TokenClaims;
use storefront_core::models::review::NewReview;
use storefront_core::reviews::validate_review;
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{CreateReviewRequest, CreateReviewResponse, ReviewListResponse, ReviewResponse};

pub async fn create_review(
    state: &AppState,
    claims: &TokenClaims,
    body: CreateReviewRequest,
) -> AppResult<CreateReviewResponse> {
    validate_review(body.rating, &body.review).map_err(|code| AppError::Validation(code.into()))?;
    let product_id = body.product_id.trim();
    if product_id.is_empty() {
        return Err(AppError::Validation("review-product-error".into()));
    }

    let review = state
        .stores
        .reviews
        .create(NewReview {
            product_id: product_id.to_string(),
            user_id: claims.id().to_string(),
            user_name: claims.subject.name.clone(),
            rating: body.rating,
            review: body.review.trim().to_string(),
        })
        .await?;
    info!(product_id = %review.product_id, user_id = claims.id(), "review created");
    Ok(CreateReviewResponse {
        success: true,
        review: ReviewResponse::new(review, Some(claims.id())),
    })
}

/// Reviews of a product, newest first, each flagged when `caller_id` wrote it.
pub async fn list_reviews(
    state: &AppState,
    product_id: &str,
    caller_id: Option<&str>,
) -> AppResult<ReviewListResponse> {
    let reviews = state.stores.reviews.list_for_product(product_id).await?;
    Ok(ReviewListResponse {
        success: true,
        reviews: reviews
            .into_iter()
            .map(|review| ReviewResponse::new(review, caller_id))
            .collect(),
    })
}
