//! Issue, activate, list and retrieve virtual codes.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{CodeError, CodeStore, Transition, generate_code, hash_retrieval_key, is_valid_format};
use crate::models::vcode::{CodeStatus, VirtualCode, format_expiry_date};
use crate::store::{Conflict, StoreError};
use crate::uuid::new_id;

/// Attempts at drawing a collision-free batch before giving up.
const MAX_ISSUE_ATTEMPTS: usize = 5;

/// A code as shown to its owner before retrieval: no plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeView {
    pub id: String,
    /// `Gift card #N`, numbered in issue order.
    pub label: String,
    pub status: CodeStatus,
    pub status_label: &'static str,
    pub expiry_date: Option<DateTime<Utc>>,
    pub expiry_display: String,
}

/// The plaintext of a retrieved code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Retrieval {
    pub id: String,
    pub code: String,
    pub label: String,
    pub expiry_display: String,
    /// True when this call repeated an earlier retrieval with the same key.
    pub replayed: bool,
}

fn gift_card_label(position: usize) -> String {
    format!("Gift card #{}", position + 1)
}

/// Virtual code engine over an injected [`CodeStore`].
#[derive(Clone)]
pub struct CodeEngine {
    store: Arc<dyn CodeStore>,
}

impl CodeEngine {
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self { store }
    }

    /// Issue one `pending` code per entry of `expiry_dates`, all or nothing.
    pub async fn issue(
        &self,
        order_id: &str,
        expiry_dates: &[Option<DateTime<Utc>>],
    ) -> Result<Vec<VirtualCode>, CodeError> {
        if expiry_dates.is_empty() {
            return Ok(Vec::new());
        }
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let now = Utc::now();
            let mut seen = HashSet::with_capacity(expiry_dates.len());
            let mut codes = Vec::with_capacity(expiry_dates.len());
            for expiry_date in expiry_dates {
                let mut code = generate_code();
                while !seen.insert(code.clone()) {
                    code = generate_code();
                }
                codes.push(VirtualCode {
                    id: new_id(),
                    order_id: order_id.to_string(),
                    code,
                    status: CodeStatus::Pending,
                    expiry_date: *expiry_date,
                    retrieval_key_hash: None,
                    retrieved_at: None,
                    created_at: now,
                });
            }

            match self.store.insert(codes.clone()).await {
                Ok(()) => {
                    info!(order_id, count = codes.len(), "issued virtual codes");
                    return Ok(codes);
                }
                Err(StoreError::Conflict(Conflict::Code)) => {
                    warn!(order_id, attempt, "virtual code collision, regenerating batch");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(CodeError::Exhausted(MAX_ISSUE_ATTEMPTS))
    }

    /// Move every `pending`, unexpired code of the order to `active`.
    pub async fn activate_order(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, CodeError> {
        let activated = self
            .store
            .transition_order(order_id, &Transition::activate(now))
            .await?;
        info!(order_id, activated, "activated virtual codes");
        Ok(activated)
    }

    /// The order's codes with their status as of `now`.
    pub async fn list(&self, order_id: &str, now: DateTime<Utc>) -> Result<Vec<CodeView>, CodeError> {
        let codes = self.store.list_for_order(order_id).await?;
        Ok(codes
            .iter()
            .enumerate()
            .map(|(position, code)| {
                let status = code.effective_status(now);
                CodeView {
                    id: code.id.clone(),
                    label: gift_card_label(position),
                    status,
                    status_label: status.label(),
                    expiry_date: code.expiry_date,
                    expiry_display: format_expiry_date(code.expiry_date),
                }
            })
            .collect())
    }

    /// Look up a code string; malformed strings never reach the store.
    pub async fn lookup(&self, code: &str) -> Result<VirtualCode, CodeError> {
        if !is_valid_format(code) {
            return Err(CodeError::InvalidFormat);
        }
        self.store
            .find_by_code(code)
            .await?
            .ok_or(CodeError::NotFound)
    }

    /// Disclose and consume a code of `order_id`.
    ///
    /// Only an `active` code can be retrieved; the first successful call moves
    /// it to `used`. A later call that presents the same `idempotency_key`
    /// gets the code again (`replayed`); any other call on a used code fails
    /// with [`CodeError::AlreadyRetrieved`].
    pub async fn retrieve(
        &self,
        order_id: &str,
        code_id: &str,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Retrieval, CodeError> {
        let codes = self.store.list_for_order(order_id).await?;
        let (position, current) = codes
            .into_iter()
            .enumerate()
            .find(|(_, code)| code.id == code_id)
            .ok_or(CodeError::NotFound)?;
        let key_hash = idempotency_key.map(hash_retrieval_key);

        let latest = if current.effective_status(now) == CodeStatus::Active {
            let consume = Transition::consume(now, key_hash.clone());
            if let Some(consumed) = self.store.transition(&current.id, &consume).await? {
                info!(order_id, code_id, "virtual code retrieved");
                return Ok(Retrieval {
                    id: consumed.id,
                    code: consumed.code,
                    label: gift_card_label(position),
                    expiry_display: format_expiry_date(consumed.expiry_date),
                    replayed: false,
                });
            }
            // Lost a race with another retrieval; re-read the winner's state.
            self.store
                .find_by_code(&current.code)
                .await?
                .ok_or(CodeError::NotFound)?
        } else {
            current
        };

        match latest.effective_status(now) {
            CodeStatus::Used
                if key_hash.is_some() && latest.retrieval_key_hash == key_hash =>
            {
                debug!(order_id, code_id, "replaying virtual code retrieval");
                Ok(Retrieval {
                    id: latest.id,
                    code: latest.code,
                    label: gift_card_label(position),
                    expiry_display: format_expiry_date(latest.expiry_date),
                    replayed: true,
                })
            }
            CodeStatus::Used => Err(CodeError::AlreadyRetrieved),
            status => Err(CodeError::NotRetrievable(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::vcode::memory::MemoryCodeStore;

    fn engine() -> CodeEngine {
        CodeEngine::new(Arc::new(MemoryCodeStore::new()))
    }

    #[tokio::test]
    async fn issued_codes_start_pending() {
        let engine = engine();
        let codes = engine.issue("order-1", &[None, None, None]).await.unwrap();
        assert_eq!(codes.len(), 3);
        assert!(codes.iter().all(|c| c.status == CodeStatus::Pending));
        assert!(codes.iter().all(|c| is_valid_format(&c.code)));

        let views = engine.list("order-1", Utc::now()).await.unwrap();
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].label, "Gift card #1");
        assert_eq!(views[2].label, "Gift card #3");
    }

    #[tokio::test]
    async fn pending_code_is_not_retrievable_until_activated() {
        let engine = engine();
        let codes = engine.issue("order-1", &[None]).await.unwrap();
        let now = Utc::now();

        let err = engine.retrieve("order-1", &codes[0].id, None, now).await.unwrap_err();
        assert!(matches!(err, CodeError::NotRetrievable(CodeStatus::Pending)));

        assert_eq!(engine.activate_order("order-1", now).await.unwrap(), 1);
        let retrieval = engine.retrieve("order-1", &codes[0].id, None, now).await.unwrap();
        assert_eq!(retrieval.code, codes[0].code);
        assert!(!retrieval.replayed);

        let views = engine.list("order-1", now).await.unwrap();
        assert_eq!(views[0].status, CodeStatus::Used);
    }

    #[tokio::test]
    async fn second_retrieval_without_key_is_refused() {
        let engine = engine();
        let codes = engine.issue("order-1", &[None]).await.unwrap();
        let now = Utc::now();
        engine.activate_order("order-1", now).await.unwrap();

        engine.retrieve("order-1", &codes[0].id, None, now).await.unwrap();
        let err = engine.retrieve("order-1", &codes[0].id, None, now).await.unwrap_err();
        assert!(matches!(err, CodeError::AlreadyRetrieved));
    }

    #[tokio::test]
    async fn retry_with_same_key_replays() {
        let engine = engine();
        let codes = engine.issue("order-1", &[None]).await.unwrap();
        let now = Utc::now();
        engine.activate_order("order-1", now).await.unwrap();

        let first = engine
            .retrieve("order-1", &codes[0].id, Some("req-42"), now)
            .await
            .unwrap();
        let again = engine
            .retrieve("order-1", &codes[0].id, Some("req-42"), now)
            .await
            .unwrap();
        assert_eq!(first.code, again.code);
        assert!(again.replayed);

        let err = engine
            .retrieve("order-1", &codes[0].id, Some("req-43"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, CodeError::AlreadyRetrieved));
    }

    #[tokio::test]
    async fn expired_code_reads_expired_and_cannot_be_retrieved() {
        let engine = engine();
        let now = Utc::now();
        let codes = engine
            .issue("order-1", &[Some(now + Duration::days(1))])
            .await
            .unwrap();
        engine.activate_order("order-1", now).await.unwrap();

        let later = now + Duration::days(2);
        let views = engine.list("order-1", later).await.unwrap();
        assert_eq!(views[0].status, CodeStatus::Expired);

        let err = engine.retrieve("order-1", &codes[0].id, None, later).await.unwrap_err();
        assert!(matches!(err, CodeError::NotRetrievable(CodeStatus::Expired)));
    }

    #[tokio::test]
    async fn expired_pending_code_is_not_activated() {
        let engine = engine();
        let now = Utc::now();
        engine
            .issue("order-1", &[Some(now - Duration::hours(1)), None])
            .await
            .unwrap();
        assert_eq!(engine.activate_order("order-1", now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn codes_are_scoped_to_their_order() {
        let engine = engine();
        let codes = engine.issue("order-1", &[None]).await.unwrap();
        engine.activate_order("order-1", Utc::now()).await.unwrap();
        let err = engine
            .retrieve("order-2", &codes[0].id, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, CodeError::NotFound));
    }

    #[tokio::test]
    async fn lookup_checks_format_first() {
        let engine = engine();
        let codes = engine.issue("order-1", &[None]).await.unwrap();
        assert_eq!(engine.lookup(&codes[0].code).await.unwrap().id, codes[0].id);
        assert!(matches!(
            engine.lookup("ab12-cd34-ef56-gh78").await.unwrap_err(),
            CodeError::InvalidFormat
        ));
        assert!(matches!(
            engine.lookup("AAAA-BBBB-CCCC-DDDD").await.unwrap_err(),
            CodeError::NotFound
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_retrievals_consume_at_most_once() {
        for _ in 0..20 {
            let engine = engine();
            let codes = engine.issue("order-1", &[None]).await.unwrap();
            engine.activate_order("order-1", Utc::now()).await.unwrap();

            let mut handles = Vec::new();
            for attempt in 0..16 {
                let engine = engine.clone();
                let code_id = codes[0].id.clone();
                handles.push(tokio::spawn(async move {
                    let key = format!("client-{attempt}");
                    engine
                        .retrieve("order-1", &code_id, Some(&key), Utc::now())
                        .await
                }));
            }

            let mut consumed = 0;
            let mut refused = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(r) if !r.replayed => consumed += 1,
                    Err(CodeError::AlreadyRetrieved) => refused += 1,
                    other => panic!("unexpected outcome: {other:?}"),
                }
            }
            assert_eq!(consumed, 1, "exactly one retrieval may consume the code");
            assert_eq!(refused, 15);
        }
    }
}
