//! Credential store contract.

use async_trait::async_trait;

use crate::models::identity::{Identity, IdentityUpdate, NewIdentity, Realm};
use crate::store::StoreError;

/// Persistent collection of user and admin identities.
///
/// Implementations must enforce, atomically with the insert:
/// - email uniqueness within a realm ([`Conflict::Email`](crate::store::Conflict::Email)),
/// - at most one `Owner` system-wide ([`Conflict::Owner`](crate::store::Conflict::Owner)).
///
/// When both rules are violated the Owner conflict is reported.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, realm: Realm, email: &str)
    -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, realm: Realm, id: &str) -> Result<Option<Identity>, StoreError>;

    async fn owner_exists(&self) -> Result<bool, StoreError>;

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError>;

    /// Returns the updated record, or `None` when no identity matched.
    async fn update(
        &self,
        realm: Realm,
        id: &str,
        update: IdentityUpdate,
    ) -> Result<Option<Identity>, StoreError>;

    /// Whether the backing store is reachable.
    async fn ping(&self) -> bool;
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}
