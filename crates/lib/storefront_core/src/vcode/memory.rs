//! In-memory virtual code store.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CodeStore, Transition};
use crate::models::vcode::VirtualCode;
use crate::store::{Conflict, StoreError};

/// Codes in issue order behind one mutex; every transition is a
/// check-and-set under the lock.
#[derive(Debug, Default)]
pub struct MemoryCodeStore {
    codes: Mutex<Vec<VirtualCode>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn insert(&self, new_codes: Vec<VirtualCode>) -> Result<(), StoreError> {
        let mut codes = self.codes.lock().await;
        let mut taken: HashSet<&str> = codes.iter().map(|c| c.code.as_str()).collect();
        if !new_codes.iter().all(|c| taken.insert(c.code.as_str())) {
            return Err(StoreError::Conflict(Conflict::Code));
        }
        codes.extend(new_codes);
        Ok(())
    }

    async fn list_for_order(&self, order_id: &str) -> Result<Vec<VirtualCode>, StoreError> {
        let codes = self.codes.lock().await;
        Ok(codes
            .iter()
            .filter(|c| c.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<VirtualCode>, StoreError> {
        let codes = self.codes.lock().await;
        Ok(codes.iter().find(|c| c.code == code).cloned())
    }

    async fn transition(
        &self,
        id: &str,
        transition: &Transition,
    ) -> Result<Option<VirtualCode>, StoreError> {
        let mut codes = self.codes.lock().await;
        match codes
            .iter_mut()
            .find(|c| c.id == id && transition.applies_to(c))
        {
            Some(code) => {
                transition.apply(code);
                Ok(Some(code.clone()))
            }
            None => Ok(None),
        }
    }

    async fn transition_order(
        &self,
        order_id: &str,
        transition: &Transition,
    ) -> Result<u64, StoreError> {
        let mut codes = self.codes.lock().await;
        let mut changed = 0;
        for code in codes
            .iter_mut()
            .filter(|c| c.order_id == order_id && transition.applies_to(c))
        {
            transition.apply(code);
            changed += 1;
        }
        Ok(changed)
    }
}
