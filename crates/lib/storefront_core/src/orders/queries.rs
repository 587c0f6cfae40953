//! PostgreSQL order store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::OrderStore;
use crate::models::order::{Order, OrderItem, OrderPage, OrderStatus};
use crate::store::StoreError;
use crate::uuid::uuidv7;

const ORDER_COLUMNS: &str = "id::text AS id, user_id::text AS user_id, items, status, created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    items: Json<Vec<OrderItem>>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

/// Orders in the `orders` table.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, user_id: &str, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        let user_id =
            Uuid::parse_str(user_id).map_err(|e| StoreError::Corrupt(format!("user id: {e}")))?;
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (id, user_id, items, status) VALUES ($1, $2, $3, $4) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(user_id)
        .bind(Json(items))
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        Order::try_from(row)
    }

    async fn find(&self, id: &str) -> Result<Option<Order>, StoreError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<OrderPage, StoreError> {
        let Ok(user_id) = Uuid::parse_str(user_id) else {
            return Ok(OrderPage {
                orders: Vec::new(),
                total: 0,
            });
        };
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3"
        ))
        .bind(user_id)
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(OrderPage {
            orders: rows
                .into_iter()
                .map(Order::try_from)
                .collect::<Result<_, _>>()?,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn confirm(&self, id: &str) -> Result<bool, StoreError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(false);
        };
        let result = sqlx::query(
            "UPDATE orders SET status = 'confirmed' WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(false);
        };
        // virtual_codes rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
