//! Product reviews.

pub mod memory;
pub mod queries;

use async_trait::async_trait;

use crate::models::review::{NewReview, Review};
use crate::store::StoreError;

/// Longest review text accepted.
pub const MAX_REVIEW_LENGTH: usize = 2_000;

/// Persistence for reviews. One review per (author, product); a second
/// fails with [`Conflict::Review`](crate::store::Conflict::Review).
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn create(&self, review: NewReview) -> Result<Review, StoreError>;

    /// Reviews of a product, newest first.
    async fn list_for_product(&self, product_id: &str) -> Result<Vec<Review>, StoreError>;
}

/// Reason a review payload was refused, as a stable error code.
pub fn validate_review(rating: u8, text: &str) -> Result<(), &'static str> {
    if !(1..=5).contains(&rating) {
        return Err("review-rating-error");
    }
    if text.trim().is_empty() || text.chars().count() > MAX_REVIEW_LENGTH {
        return Err("review-text-error");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_be_one_to_five() {
        assert_eq!(validate_review(0, "fine"), Err("review-rating-error"));
        assert_eq!(validate_review(6, "fine"), Err("review-rating-error"));
        assert!(validate_review(1, "fine").is_ok());
        assert!(validate_review(5, "fine").is_ok());
    }

    #[test]
    fn text_is_required() {
        assert_eq!(validate_review(4, "   "), Err("review-text-error"));
        let long = "x".repeat(MAX_REVIEW_LENGTH + 1);
        assert_eq!(validate_review(4, &long), Err("review-text-error"));
    }
}
