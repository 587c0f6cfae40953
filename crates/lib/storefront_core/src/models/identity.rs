//! User and admin identities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// Privilege level of an identity.
///
/// Exactly one identity system-wide may hold [`Role::Owner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Owner")]
    Owner,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Back-office roles (Owner and Admin).
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    /// Realm whose identities carry this role.
    pub fn realm(self) -> Realm {
        if self.is_staff() {
            Realm::Admin
        } else {
            Realm::Customer
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Whether an identity may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Identity collection. Emails are unique per realm, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Realm {
    /// Back-office accounts.
    Admin,
    /// Storefront shoppers.
    Customer,
}

impl Realm {
    pub fn as_str(self) -> &'static str {
        match self {
            Realm::Admin => "admin",
            Realm::Customer => "customer",
        }
    }
}

impl FromStr for Realm {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Realm::Admin),
            "customer" => Ok(Realm::Customer),
            other => Err(UnknownVariant {
                kind: "realm",
                value: other.to_string(),
            }),
        }
    }
}

/// Avatar / cover image reference held in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cover {
    #[serde(rename = "_id")]
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_data_url: Option<String>,
}

/// Stored identity, including the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub realm: Realm,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub cover: Option<Cover>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub about: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Fields required to create an identity. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub realm: Realm,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub cover: Option<Cover>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub about: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityUpdate {
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub status: Option<AccountStatus>,
    pub cover: Option<Cover>,
    pub phone: Option<String>,
    pub about: Option<String>,
}

impl IdentityUpdate {
    pub fn password(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            ..Self::default()
        }
    }

    /// Apply the update to an in-memory record.
    pub fn apply(self, identity: &mut Identity, now: DateTime<Utc>) {
        if let Some(hash) = self.password_hash {
            identity.password_hash = hash;
        }
        if let Some(name) = self.name {
            identity.name = name;
        }
        if let Some(status) = self.status {
            identity.status = status;
        }
        if let Some(cover) = self.cover {
            identity.cover = Some(cover);
        }
        if let Some(phone) = self.phone {
            identity.phone = Some(phone);
        }
        if let Some(about) = self.about {
            identity.about = Some(about);
        }
        identity.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"Owner\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!("Owner".parse::<Role>().unwrap(), Role::Owner);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Owner.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(!Role::User.is_staff());
    }

    #[test]
    fn cover_uses_underscore_id() {
        let cover = Cover {
            id: "img-1".into(),
            url: "https://cdn.example.com/img-1".into(),
            blur_data_url: None,
        };
        let json = serde_json::to_value(&cover).unwrap();
        assert_eq!(json["_id"], "img-1");
        assert!(json.get("blurDataUrl").is_none());
    }
}
