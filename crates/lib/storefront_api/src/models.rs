//! Request and response bodies. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::models::identity::{AccountStatus, Cover, Identity, Role};
use storefront_core::models::order::{Order, OrderItem, OrderStatus};
use storefront_core::models::review::Review;
use storefront_core::models::vcode::CodeStatus;
use storefront_core::vcode::{CodeView, Retrieval};

/// Error body shared by every rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

/// Plain acknowledgement carrying a stable message code.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Public view of an identity; never includes the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Cover>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for UserResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role,
            status: identity.status,
            cover: identity.cover.clone(),
            phone: identity.phone.clone(),
            gender: identity.gender.clone(),
            about: identity.about.clone(),
            created_at: identity.created_at,
        }
    }
}

/// Session token plus the identity it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserResponse,
    pub orders: Vec<OrderResponse>,
    /// Number of pages at the requested limit.
    pub count: u64,
    pub total: u64,
    pub page: u64,
}

// ---------------------------------------------------------------------------
// Orders and virtual codes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            items: order.items.clone(),
            status: order.status,
            total: order.total(),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order: OrderResponse,
    /// Number of virtual codes issued for the order.
    pub virtual_codes: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOrderResponse {
    pub success: bool,
    pub order_id: String,
    /// Codes moved from `pending` to `active` by this call.
    pub activated: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeListResponse {
    pub success: bool,
    pub codes: Vec<CodeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResponse {
    pub success: bool,
    pub code: Retrieval,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeLookupResponse {
    pub success: bool,
    pub valid_format: bool,
    /// Present only when the caller owns the code's order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CodeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_display: Option<String>,
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: String,
    pub rating: u8,
    pub review: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub product_id: String,
    pub user_name: String,
    pub rating: u8,
    pub review: String,
    pub created_at: DateTime<Utc>,
    /// Whether the authenticated caller wrote this review.
    pub is_own: bool,
}

impl ReviewResponse {
    pub fn new(review: Review, caller_id: Option<&str>) -> Self {
        let is_own = caller_id == Some(review.user_id.as_str());
        Self {
            id: review.id,
            product_id: review.product_id,
            user_name: review.user_name,
            rating: review.rating,
            review: review.review,
            created_at: review.created_at,
            is_own,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewListResponse {
    pub success: bool,
    pub reviews: Vec<ReviewResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateReviewResponse {
    pub success: bool,
    pub review: ReviewResponse,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store_connected: bool,
}
