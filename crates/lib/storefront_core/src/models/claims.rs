//! Session-token claims.

use serde::{Deserialize, Serialize};

use super::identity::{AccountStatus, Cover, Identity, Role};

/// Identity fields carried in a session token.
///
/// Everything except `cover` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSubject {
    /// Identity id.
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub cover: Option<Cover>,
    pub status: AccountStatus,
    pub role: Role,
}

impl From<&Identity> for TokenSubject {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            cover: identity.cover.clone(),
            status: identity.status,
            role: identity.role,
        }
    }
}

/// Full claim set of a signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(flatten)]
    pub subject: TokenSubject,
    /// Issued at (unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (unix timestamp, seconds).
    pub exp: i64,
}

impl TokenClaims {
    pub fn id(&self) -> &str {
        &self.subject.id
    }

    pub fn role(&self) -> Role {
        self.subject.role
    }
}
