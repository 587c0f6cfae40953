//! In-memory credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::identities::IdentityStore;
use crate::models::identity::{Identity, IdentityUpdate, NewIdentity, Realm, Role};
use crate::store::{Conflict, StoreError};
use crate::uuid::new_id;

/// Identities keyed by id. Uniqueness checks and the insert happen under one
/// write lock.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(
        &self,
        realm: Realm,
        email: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let identities = self.identities.read().await;
        Ok(identities
            .values()
            .find(|i| i.realm == realm && i.email == email)
            .cloned())
    }

    async fn find_by_id(&self, realm: Realm, id: &str) -> Result<Option<Identity>, StoreError> {
        let identities = self.identities.read().await;
        Ok(identities.get(id).filter(|i| i.realm == realm).cloned())
    }

    async fn owner_exists(&self) -> Result<bool, StoreError> {
        let identities = self.identities.read().await;
        Ok(identities.values().any(|i| i.role == Role::Owner))
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let mut identities = self.identities.write().await;
        if new.role == Role::Owner && identities.values().any(|i| i.role == Role::Owner) {
            return Err(StoreError::Conflict(Conflict::Owner));
        }
        if identities
            .values()
            .any(|i| i.realm == new.realm && i.email == new.email)
        {
            return Err(StoreError::Conflict(Conflict::Email));
        }

        let now = Utc::now();
        let identity = Identity {
            id: new_id(),
            realm: new.realm,
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            role: new.role,
            status: new.status,
            cover: new.cover,
            phone: new.phone,
            gender: new.gender,
            about: new.about,
            created_at: now,
            updated_at: now,
        };
        identities.insert(identity.id.clone(), identity.clone());
        Ok(identity)
    }

    async fn update(
        &self,
        realm: Realm,
        id: &str,
        update: IdentityUpdate,
    ) -> Result<Option<Identity>, StoreError> {
        let mut identities = self.identities.write().await;
        match identities.get_mut(id).filter(|i| i.realm == realm) {
            Some(identity) => {
                update.apply(identity, Utc::now());
                Ok(Some(identity.clone()))
            }
            None => Ok(None),
        }
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::AccountStatus;

    fn new_identity(realm: Realm, email: &str, role: Role) -> NewIdentity {
        NewIdentity {
            realm,
            email: email.into(),
            password_hash: "hash".into(),
            name: "Someone".into(),
            role,
            status: AccountStatus::Active,
            cover: None,
            phone: None,
            gender: None,
            about: None,
        }
    }

    #[tokio::test]
    async fn only_one_owner() {
        let store = MemoryIdentityStore::new();
        store
            .create(new_identity(Realm::Admin, "owner@example.com", Role::Owner))
            .await
            .unwrap();
        let err = store
            .create(new_identity(Realm::Admin, "second@example.com", Role::Owner))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(Conflict::Owner)));
        assert!(store.owner_exists().await.unwrap());
    }

    #[tokio::test]
    async fn email_unique_per_realm() {
        let store = MemoryIdentityStore::new();
        store
            .create(new_identity(Realm::Customer, "a@example.com", Role::User))
            .await
            .unwrap();
        let err = store
            .create(new_identity(Realm::Customer, "a@example.com", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(Conflict::Email)));

        // Same email in the other realm is a different identity.
        store
            .create(new_identity(Realm::Admin, "a@example.com", Role::Admin))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_touches_only_given_fields() {
        let store = MemoryIdentityStore::new();
        let created = store
            .create(new_identity(Realm::Customer, "b@example.com", Role::User))
            .await
            .unwrap();
        let updated = store
            .update(Realm::Customer, &created.id, IdentityUpdate::password("new-hash".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.password_hash, "new-hash");
        assert_eq!(updated.name, created.name);

        let missing = store
            .update(Realm::Admin, &created.id, IdentityUpdate::default())
            .await
            .unwrap();
        assert!(missing.is_none(), "realm must match");
    }
}
