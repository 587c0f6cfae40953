//! In-memory review store.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::ReviewStore;
use crate::models::review::{NewReview, Review};
use crate::store::{Conflict, StoreError};
use crate::uuid::new_id;

#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    reviews: RwLock<Vec<Review>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn create(&self, new: NewReview) -> Result<Review, StoreError> {
        let mut reviews = self.reviews.write().await;
        if reviews
            .iter()
            .any(|r| r.product_id == new.product_id && r.user_id == new.user_id)
        {
            return Err(StoreError::Conflict(Conflict::Review));
        }
        let review = Review {
            id: new_id(),
            product_id: new.product_id,
            user_id: new.user_id,
            user_name: new.user_name,
            rating: new.rating,
            review: new.review,
            created_at: Utc::now(),
        };
        reviews.push(review.clone());
        Ok(review)
    }

    async fn list_for_product(&self, product_id: &str) -> Result<Vec<Review>, StoreError> {
        let reviews = self.reviews.read().await;
        Ok(reviews
            .iter()
            .rev()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(user_id: &str) -> NewReview {
        NewReview {
            product_id: "p1".into(),
            user_id: user_id.into(),
            user_name: "Reviewer".into(),
            rating: 4,
            review: "Nice".into(),
        }
    }

    #[tokio::test]
    async fn one_review_per_author_and_product() {
        let store = MemoryReviewStore::new();
        store.create(review("u1")).await.unwrap();
        let err = store.create(review("u1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(Conflict::Review)));
        store.create(review("u2")).await.unwrap();

        let listed = store.list_for_product("p1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].user_id, "u2", "newest first");
    }
}
