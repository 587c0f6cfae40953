//! PostgreSQL credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::identities::IdentityStore;
use crate::models::identity::{Cover, Identity, IdentityUpdate, NewIdentity, Realm, Role};
use crate::store::{Conflict, StoreError};
use crate::uuid::uuidv7;

const IDENTITY_COLUMNS: &str = "id::text AS id, realm, email, password_hash, name, role, \
     status, cover, phone, gender, about, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: String,
    realm: String,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    status: String,
    cover: Option<Json<Cover>>,
    phone: Option<String>,
    gender: Option<String>,
    about: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = StoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: row.id,
            realm: row.realm.parse()?,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            role: row.role.parse()?,
            status: row.status.parse()?,
            cover: row.cover.map(|Json(cover)| cover),
            phone: row.phone,
            gender: row.gender,
            about: row.about,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Identities in the `identities` table.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_email(
        &self,
        realm: Realm,
        email: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE realm = $1 AND email = $2"
        ))
        .bind(realm.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }

    async fn find_by_id(&self, realm: Realm, id: &str) -> Result<Option<Identity>, StoreError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE realm = $1 AND id = $2"
        ))
        .bind(realm.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }

    async fn owner_exists(&self) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM identities WHERE role = 'Owner')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let is_owner = new.role == Role::Owner;
        let result = sqlx::query_as::<_, IdentityRow>(&format!(
            "INSERT INTO identities \
             (id, realm, email, password_hash, name, role, status, cover, phone, gender, about) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(new.realm.as_str())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(new.role.as_str())
        .bind(new.status.as_str())
        .bind(new.cover.map(Json))
        .bind(&new.phone)
        .bind(&new.gender)
        .bind(&new.about)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Identity::try_from(row),
            Err(e) => {
                let err = StoreError::from(e);
                // Both constraints may be violated; the Owner rule takes precedence.
                if is_owner
                    && matches!(err, StoreError::Conflict(Conflict::Email))
                    && self.owner_exists().await?
                {
                    return Err(StoreError::Conflict(Conflict::Owner));
                }
                Err(err)
            }
        }
    }

    async fn update(
        &self,
        realm: Realm,
        id: &str,
        update: IdentityUpdate,
    ) -> Result<Option<Identity>, StoreError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "UPDATE identities SET \
               password_hash = COALESCE($3, password_hash), \
               name = COALESCE($4, name), \
               status = COALESCE($5, status), \
               cover = COALESCE($6, cover), \
               phone = COALESCE($7, phone), \
               about = COALESCE($8, about), \
               updated_at = now() \
             WHERE realm = $1 AND id = $2 \
             RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(realm.as_str())
        .bind(id)
        .bind(update.password_hash)
        .bind(update.name)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.cover.map(Json))
        .bind(update.phone)
        .bind(update.about)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
