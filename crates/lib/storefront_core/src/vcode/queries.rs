//! PostgreSQL virtual code store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CodeStore, Transition};
use crate::models::vcode::VirtualCode;
use crate::store::StoreError;

const CODE_COLUMNS: &str = "id::text AS id, order_id::text AS order_id, code, status, \
     expiry_date, retrieval_key_hash, retrieved_at, created_at";

#[derive(sqlx::FromRow)]
struct CodeRow {
    id: String,
    order_id: String,
    code: String,
    status: String,
    expiry_date: Option<DateTime<Utc>>,
    retrieval_key_hash: Option<String>,
    retrieved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CodeRow> for VirtualCode {
    type Error = StoreError;

    fn try_from(row: CodeRow) -> Result<Self, Self::Error> {
        Ok(VirtualCode {
            id: row.id,
            order_id: row.order_id,
            code: row.code,
            status: row.status.parse()?,
            expiry_date: row.expiry_date,
            retrieval_key_hash: row.retrieval_key_hash,
            retrieved_at: row.retrieved_at,
            created_at: row.created_at,
        })
    }
}

/// Codes in the `virtual_codes` table.
#[derive(Debug, Clone)]
pub struct PgCodeStore {
    pool: PgPool,
}

impl PgCodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CodeStore for PgCodeStore {
    async fn insert(&self, codes: Vec<VirtualCode>) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for code in &codes {
            let id = Uuid::parse_str(&code.id)
                .map_err(|e| StoreError::Corrupt(format!("code id: {e}")))?;
            let order_id = Uuid::parse_str(&code.order_id)
                .map_err(|e| StoreError::Corrupt(format!("order id: {e}")))?;
            sqlx::query(
                "INSERT INTO virtual_codes (id, order_id, code, status, expiry_date, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(id)
            .bind(order_id)
            .bind(&code.code)
            .bind(code.status.as_str())
            .bind(code.expiry_date)
            .bind(code.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_for_order(&self, order_id: &str) -> Result<Vec<VirtualCode>, StoreError> {
        let Ok(order_id) = Uuid::parse_str(order_id) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query_as::<_, CodeRow>(&format!(
            "SELECT {CODE_COLUMNS} FROM virtual_codes WHERE order_id = $1 ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(VirtualCode::try_from).collect()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<VirtualCode>, StoreError> {
        let row = sqlx::query_as::<_, CodeRow>(&format!(
            "SELECT {CODE_COLUMNS} FROM virtual_codes WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(VirtualCode::try_from).transpose()
    }

    async fn transition(
        &self,
        id: &str,
        transition: &Transition,
    ) -> Result<Option<VirtualCode>, StoreError> {
        if !transition.is_permitted() {
            return Ok(None);
        }
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        // Single conditional UPDATE: the status check and the write are one statement.
        let row = sqlx::query_as::<_, CodeRow>(&format!(
            "UPDATE virtual_codes SET \
               status = $3, \
               retrieval_key_hash = CASE WHEN $3 = 'used' THEN $4 ELSE retrieval_key_hash END, \
               retrieved_at = CASE WHEN $3 = 'used' THEN $5 ELSE retrieved_at END \
             WHERE id = $1 AND status = $2 \
               AND (expiry_date IS NULL OR expiry_date >= $5) \
             RETURNING {CODE_COLUMNS}"
        ))
        .bind(id)
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .bind(&transition.retrieval_key_hash)
        .bind(transition.at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(VirtualCode::try_from).transpose()
    }

    async fn transition_order(
        &self,
        order_id: &str,
        transition: &Transition,
    ) -> Result<u64, StoreError> {
        if !transition.is_permitted() {
            return Ok(0);
        }
        let Ok(order_id) = Uuid::parse_str(order_id) else {
            return Ok(0);
        };
        let result = sqlx::query(
            "UPDATE virtual_codes SET \
               status = $3, \
               retrieval_key_hash = CASE WHEN $3 = 'used' THEN $4 ELSE retrieval_key_hash END, \
               retrieved_at = CASE WHEN $3 = 'used' THEN $5 ELSE retrieved_at END \
             WHERE order_id = $1 AND status = $2 \
               AND (expiry_date IS NULL OR expiry_date >= $5)",
        )
        .bind(order_id)
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .bind(&transition.retrieval_key_hash)
        .bind(transition.at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
