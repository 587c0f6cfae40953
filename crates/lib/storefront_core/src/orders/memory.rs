//! In-memory order store.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::OrderStore;
use crate::models::order::{Order, OrderItem, OrderPage, OrderStatus};
use crate::store::StoreError;
use crate::uuid::new_id;

/// Orders in insertion order.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, user_id: &str, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        let order = Order {
            id: new_id(),
            user_id: user_id.to_string(),
            items,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    async fn find(&self, id: &str) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<OrderPage, StoreError> {
        let orders = self.orders.read().await;
        let mine: Vec<&Order> = orders.iter().rev().filter(|o| o.user_id == user_id).collect();
        let page = mine
            .iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|o| (*o).clone())
            .collect();
        Ok(OrderPage {
            orders: page,
            total: mine.len() as u64,
        })
    }

    async fn confirm(&self, id: &str) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().await;
        match orders
            .iter_mut()
            .find(|o| o.id == id && o.status == OrderStatus::Pending)
        {
            Some(order) => {
                order.status = OrderStatus::Confirmed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|o| o.id != id);
        Ok(orders.len() < before)
    }
}
