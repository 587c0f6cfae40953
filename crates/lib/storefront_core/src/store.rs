//! Persistence plumbing shared by every store.
//!
//! Each domain exposes an `async_trait` store with a PostgreSQL and an
//! in-memory implementation. [`Stores`] bundles one of each so the HTTP layer
//! and the CLI can be wired against either backend.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::auth::identities::IdentityStore;
use crate::auth::memory::MemoryIdentityStore;
use crate::auth::queries::PgIdentityStore;
use crate::orders::OrderStore;
use crate::orders::memory::MemoryOrderStore;
use crate::orders::queries::PgOrderStore;
use crate::reviews::ReviewStore;
use crate::reviews::memory::MemoryReviewStore;
use crate::reviews::queries::PgReviewStore;
use crate::vcode::CodeStore;
use crate::vcode::memory::MemoryCodeStore;
use crate::vcode::queries::PgCodeStore;

/// Uniqueness rule a write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Email already registered in the realm.
    Email,
    /// An `Owner` identity already exists.
    Owner,
    /// Virtual code string collision.
    Code,
    /// The author already reviewed the product.
    Review,
}

impl Conflict {
    /// Map a PostgreSQL constraint name to the rule it enforces.
    pub fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "identities_realm_email_key" => Some(Conflict::Email),
            "identities_single_owner" => Some(Conflict::Owner),
            "virtual_codes_code_key" => Some(Conflict::Code),
            "reviews_product_user_key" => Some(Conflict::Review),
            _ => None,
        }
    }
}

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0:?}")]
    Conflict(Conflict),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
            && let Some(conflict) = db.constraint().and_then(Conflict::from_constraint)
        {
            return StoreError::Conflict(conflict);
        }
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Db(other),
        }
    }
}

impl From<crate::models::UnknownVariant> for StoreError {
    fn from(e: crate::models::UnknownVariant) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

/// One implementation of every store.
#[derive(Clone)]
pub struct Stores {
    pub identities: Arc<dyn IdentityStore>,
    pub orders: Arc<dyn OrderStore>,
    pub codes: Arc<dyn CodeStore>,
    pub reviews: Arc<dyn ReviewStore>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            identities: Arc::new(PgIdentityStore::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            codes: Arc::new(PgCodeStore::new(pool.clone())),
            reviews: Arc::new(PgReviewStore::new(pool)),
        }
    }

    /// Process-local stores; contents are lost on exit.
    pub fn in_memory() -> Self {
        Self {
            identities: Arc::new(MemoryIdentityStore::new()),
            orders: Arc::new(MemoryOrderStore::new()),
            codes: Arc::new(MemoryCodeStore::new()),
            reviews: Arc::new(MemoryReviewStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_conflicts() {
        assert_eq!(
            Conflict::from_constraint("identities_single_owner"),
            Some(Conflict::Owner)
        );
        assert_eq!(
            Conflict::from_constraint("identities_realm_email_key"),
            Some(Conflict::Email)
        );
        assert_eq!(Conflict::from_constraint("something_else"), None);
    }
}
