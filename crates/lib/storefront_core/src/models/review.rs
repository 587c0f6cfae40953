//! Product reviews.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub user_name: String,
    /// 1 through 5.
    pub rating: u8,
    pub review: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub review: String,
}
