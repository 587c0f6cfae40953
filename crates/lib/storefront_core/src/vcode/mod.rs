//! Virtual (gift-card) codes.
//!
//! Codes look like `XXXX-XXXX-XXXX-XXXX` over `[A-Z0-9]`. They are issued
//! `pending` when an order is placed, activated when the order is confirmed,
//! and consumed (`used`) by the purchaser's first retrieval. Expiry is never
//! written; it is derived on read from the expiry date.
//!
//! The store's [`CodeStore::transition`] is the only way to change a code's
//! status. It is a conditional update, so two concurrent retrievals of one
//! code cannot both consume it.

pub mod engine;
pub mod memory;
pub mod queries;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use engine::{CodeEngine, CodeView, Retrieval};

use crate::models::vcode::{CodeStatus, VirtualCode};
use crate::store::StoreError;

/// Characters a code may contain.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const SEGMENTS: usize = 4;
const SEGMENT_LEN: usize = 4;

/// Virtual code errors.
#[derive(Debug, Error)]
pub enum CodeError {
    #[error("Virtual code not found")]
    NotFound,

    #[error("Invalid virtual code format")]
    InvalidFormat,

    #[error("Virtual code is {0}, not active")]
    NotRetrievable(CodeStatus),

    #[error("Virtual code has already been retrieved")]
    AlreadyRetrieved,

    #[error("Could not generate unique codes after {0} attempts")]
    Exhausted(usize),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Generate a code from the thread-local CSPRNG (ChaCha, seeded from the OS).
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(SEGMENTS * (SEGMENT_LEN + 1));
    for segment in 0..SEGMENTS {
        if segment > 0 {
            code.push('-');
        }
        for _ in 0..SEGMENT_LEN {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            code.push(char::from(CODE_ALPHABET[idx]));
        }
    }
    code
}

/// Strict shape check: four groups of four `[A-Z0-9]` joined by hyphens.
pub fn is_valid_format(code: &str) -> bool {
    let segments: Vec<&str> = code.split('-').collect();
    segments.len() == SEGMENTS
        && segments.iter().all(|segment| {
            segment.len() == SEGMENT_LEN
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        })
}

/// SHA-256 (hex) of a retrieval idempotency key, as stored.
pub fn hash_retrieval_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A conditional status change: applies only if the stored status equals
/// `from` and the code has not expired at `at`.
///
/// Built only through [`Transition::activate`] and [`Transition::consume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    from: CodeStatus,
    to: CodeStatus,
    at: DateTime<Utc>,
    /// Recorded with `active → used`.
    retrieval_key_hash: Option<String>,
}

impl Transition {
    /// `pending → active`.
    pub fn activate(at: DateTime<Utc>) -> Self {
        Self {
            from: CodeStatus::Pending,
            to: CodeStatus::Active,
            at,
            retrieval_key_hash: None,
        }
    }

    /// `active → used`.
    pub fn consume(at: DateTime<Utc>, retrieval_key_hash: Option<String>) -> Self {
        Self {
            from: CodeStatus::Active,
            to: CodeStatus::Used,
            at,
            retrieval_key_hash,
        }
    }

    /// Whether `from → to` is an edge of the status machine. Stores refuse
    /// anything else, so a terminal code never moves again.
    pub fn is_permitted(&self) -> bool {
        !self.from.is_terminal() && self.from.can_transition_to(self.to)
    }

    /// Whether `code` satisfies the precondition.
    pub fn applies_to(&self, code: &VirtualCode) -> bool {
        self.is_permitted()
            && code.status == self.from
            && !crate::models::vcode::is_code_expired(code.expiry_date, self.at)
    }

    /// Apply to an in-memory record. Callers check [`Transition::applies_to`] first.
    pub fn apply(&self, code: &mut VirtualCode) {
        code.status = self.to;
        if self.to == CodeStatus::Used {
            code.retrieval_key_hash = self.retrieval_key_hash.clone();
            code.retrieved_at = Some(self.at);
        }
    }
}

/// Persistence for virtual codes.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Insert all codes or none. A duplicate code string fails with
    /// [`Conflict::Code`](crate::store::Conflict::Code).
    async fn insert(&self, codes: Vec<VirtualCode>) -> Result<(), StoreError>;

    /// Codes of an order in issue order.
    async fn list_for_order(&self, order_id: &str) -> Result<Vec<VirtualCode>, StoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<VirtualCode>, StoreError>;

    /// Atomically apply `transition` to one code. `None` when the
    /// precondition did not hold (or the code does not exist).
    async fn transition(
        &self,
        id: &str,
        transition: &Transition,
    ) -> Result<Option<VirtualCode>, StoreError>;

    /// Atomically apply `transition` to every eligible code of an order.
    /// Returns how many codes changed.
    async fn transition_order(
        &self,
        order_id: &str,
        transition: &Transition,
    ) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_code() {
        assert!(is_valid_format("AB12-CD34-EF56-GH78"));
        assert!(is_valid_format("0000-ZZZZ-9A9A-B0B0"));
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(!is_valid_format("ab12-cd34-ef56-gh78"), "lowercase");
        assert!(!is_valid_format("AB12CD34EF56GH78"), "no separators");
        assert!(!is_valid_format("AB12-CD34-EF56"), "three segments");
        assert!(!is_valid_format("AB12-CD34-EF56-GH78-IJ90"), "five segments");
        assert!(!is_valid_format("AB12-CD34-EF56-GH7"), "short segment");
        assert!(!is_valid_format("AB12-CD34-EF56-GH78 "), "trailing space");
        assert!(!is_valid_format("AB12_CD34_EF56_GH78"), "wrong separator");
        assert!(!is_valid_format("ÄB12-CD34-EF56-GH78"), "non-ascii");
        assert!(!is_valid_format(""));
    }

    #[test]
    fn generated_codes_are_well_formed() {
        for _ in 0..1_000 {
            let code = generate_code();
            assert!(is_valid_format(&code), "bad code: {code}");
        }
    }

    #[test]
    fn generated_codes_differ() {
        let codes: std::collections::HashSet<String> = (0..200).map(|_| generate_code()).collect();
        assert_eq!(codes.len(), 200);
    }

    #[test]
    fn only_machine_edges_are_permitted() {
        let now = Utc::now();
        assert!(Transition::activate(now).is_permitted());
        assert!(Transition::consume(now, None).is_permitted());

        let reopen = Transition {
            from: CodeStatus::Used,
            to: CodeStatus::Active,
            at: now,
            retrieval_key_hash: None,
        };
        assert!(!reopen.is_permitted());
        let skip = Transition {
            from: CodeStatus::Pending,
            to: CodeStatus::Used,
            at: now,
            retrieval_key_hash: None,
        };
        assert!(!skip.is_permitted());
    }

    #[test]
    fn retrieval_keys_are_hashed() {
        let hash = hash_retrieval_key("retry-1");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_retrieval_key("retry-1"));
        assert_ne!(hash, hash_retrieval_key("retry-2"));
    }
}
