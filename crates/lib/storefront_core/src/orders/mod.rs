//! Orders and the virtual-code expiry dates they imply.

pub mod memory;
pub mod queries;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::models::order::{Order, OrderItem, OrderPage};
use crate::store::StoreError;

/// Upper bound on units of one line.
pub const MAX_QUANTITY: u32 = 100;

/// Upper bound on virtual units (and so issued codes) across one order.
pub const MAX_VIRTUAL_UNITS: u32 = 100;

/// Persistence for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, user_id: &str, items: Vec<OrderItem>) -> Result<Order, StoreError>;

    async fn find(&self, id: &str) -> Result<Option<Order>, StoreError>;

    /// A user's orders, newest first.
    async fn list_for_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<OrderPage, StoreError>;

    /// `pending → confirmed`. Returns false when the order was not pending.
    async fn confirm(&self, id: &str) -> Result<bool, StoreError>;

    /// Remove an order that could not be completed. Returns false when it
    /// did not exist.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Reason an order payload was refused, as a stable error code.
pub fn validate_items(items: &[OrderItem]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("order-empty-error");
    }
    for item in items {
        if item.name.trim().is_empty() {
            return Err("order-item-name-error");
        }
        if item.quantity == 0 || item.quantity > MAX_QUANTITY {
            return Err("order-item-quantity-error");
        }
        if item.unit_price < 0 {
            return Err("order-item-price-error");
        }
        if item.validity_days == Some(0) {
            return Err("order-item-validity-error");
        }
    }
    let virtual_units: u32 = items
        .iter()
        .filter(|item| item.is_virtual)
        .map(|item| item.quantity)
        .sum();
    if virtual_units > MAX_VIRTUAL_UNITS {
        return Err("order-virtual-units-error");
    }
    Ok(())
}

/// One expiry date per virtual unit ordered. A line's own `validity_days`
/// wins over `default_validity_days`; neither means no expiry.
pub fn code_expiries(
    items: &[OrderItem],
    now: DateTime<Utc>,
    default_validity_days: Option<u32>,
) -> Vec<Option<DateTime<Utc>>> {
    items
        .iter()
        .filter(|item| item.is_virtual)
        .flat_map(|item| {
            let expiry = item
                .validity_days
                .or(default_validity_days)
                .map(|days| now + Duration::days(i64::from(days)));
            std::iter::repeat_n(expiry, item.quantity as usize)
        })
        .collect()
}
