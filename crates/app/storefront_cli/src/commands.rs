use std::collections::HashSet;

use sqlx::postgres::PgPoolOptions;
use storefront_core::auth::identities::{IdentityStore, normalize_email};
use storefront_core::auth::password::{hash_password, validate_password};
use storefront_core::auth::queries::PgIdentityStore;
use storefront_core::models::identity::{AccountStatus, NewIdentity, Realm, Role};
use storefront_core::store::{Conflict, StoreError};
use storefront_core::vcode::generate_code;

use crate::{Error, Result};

/// Upper bound for one `generate-codes` run.
pub const MAX_GENERATED_CODES: usize = 10_000;

/// `count` distinct codes.
pub fn generate_codes(count: usize) -> Result<Vec<String>> {
    if count == 0 || count > MAX_GENERATED_CODES {
        return Err(Error::Custom(format!(
            "count must be between 1 and {MAX_GENERATED_CODES}"
        )));
    }
    let mut seen = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);
    while codes.len() < count {
        let code = generate_code();
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    log::debug!("generated {count} codes");
    Ok(codes)
}

/// Insert a back-office identity and return its id.
pub async fn add_admin(
    database_url: &str,
    email: &str,
    password: &str,
    name: &str,
    owner: bool,
) -> Result<String> {
    validate_password(password)?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    storefront_core::migrate::migrate(&pool).await?;
    let store = PgIdentityStore::new(pool);

    let role = if owner { Role::Owner } else { Role::Admin };
    let created = store
        .create(NewIdentity {
            realm: Realm::Admin,
            email: normalize_email(email),
            password_hash: hash_password(password)?,
            name: name.to_string(),
            role,
            status: AccountStatus::Active,
            cover: None,
            phone: None,
            gender: None,
            about: None,
        })
        .await;

    match created {
        Ok(identity) => {
            log::info!("created {} account {}", identity.role, identity.email);
            Ok(identity.id)
        }
        Err(StoreError::Conflict(Conflict::Owner)) => {
            Err(Error::Custom("an Owner account already exists".into()))
        }
        Err(StoreError::Conflict(Conflict::Email)) => Err(Error::Custom(format!(
            "an admin account for {email} already exists"
        ))),
        Err(e) => Err(e.into()),
    }
}
