//! PostgreSQL review store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::ReviewStore;
use crate::models::review::{NewReview, Review};
use crate::store::StoreError;
use crate::uuid::uuidv7;

const REVIEW_COLUMNS: &str =
    "id::text AS id, product_id, user_id::text AS user_id, user_name, rating, review, created_at";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    product_id: String,
    user_id: String,
    user_name: String,
    rating: i16,
    review: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .map_err(|_| StoreError::Corrupt(format!("review rating {}", row.rating)))?;
        Ok(Review {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            user_name: row.user_name,
            rating,
            review: row.review,
            created_at: row.created_at,
        })
    }
}

/// Reviews in the `reviews` table.
#[derive(Debug, Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn create(&self, new: NewReview) -> Result<Review, StoreError> {
        let user_id = Uuid::parse_str(&new.user_id)
            .map_err(|e| StoreError::Corrupt(format!("user id: {e}")))?;
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "INSERT INTO reviews (id, product_id, user_id, user_name, rating, review) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(&new.product_id)
        .bind(user_id)
        .bind(&new.user_name)
        .bind(i16::from(new.rating))
        .bind(&new.review)
        .fetch_one(&self.pool)
        .await?;
        Review::try_from(row)
    }

    async fn list_for_product(&self, product_id: &str) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Review::try_from).collect()
    }
}
