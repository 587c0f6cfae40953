//! Identity flows: registration, login, password reset and change.

use storefront_core::auth::identities::{IdentityStore, normalize_email};
use storefront_core::auth::jwt::TokenService;
use storefront_core::auth::password::{hash_password, validate_password, verify_password};
use storefront_core::models::claims::{TokenClaims, TokenSubject};
use storefront_core::models::identity::{
    AccountStatus, Identity, IdentityUpdate, NewIdentity, Realm, Role,
};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::rejection_code;
use crate::models::{AuthResponse, MessageResponse, UserResponse};

fn policy_checked(password: &str) -> AppResult<()> {
    validate_password(password).map_err(|_| AppError::Validation("password-policy-error".into()))
}

fn require_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name-required-error".into()));
    }
    Ok(name.to_string())
}

fn require_email(email: &str) -> AppResult<String> {
    let email = normalize_email(email);
    if !email.contains('@') {
        return Err(AppError::Validation("invalid-email-format".into()));
    }
    Ok(email)
}

fn issue(tokens: &TokenService, identity: &Identity, message: &str) -> AppResult<AuthResponse> {
    let token = tokens.generate_token(&TokenSubject::from(identity))?;
    Ok(AuthResponse {
        success: true,
        message: message.to_string(),
        token,
        user: UserResponse::from(identity),
    })
}

/// Register a storefront customer (role `user`, status `active`).
pub async fn register_customer(
    identities: &dyn IdentityStore,
    tokens: &TokenService,
    name: &str,
    email: &str,
    password: &str,
) -> AppResult<AuthResponse> {
    let name = require_name(name)?;
    let email = require_email(email)?;
    policy_checked(password)?;

    if identities
        .find_by_email(Realm::Customer, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("email-exist-error".into()));
    }

    let identity = identities
        .create(NewIdentity {
            realm: Realm::Customer,
            email,
            password_hash: hash_password(password)?,
            name,
            role: Role::User,
            status: AccountStatus::Active,
            cover: None,
            phone: None,
            gender: None,
            about: None,
        })
        .await?;
    info!(user_id = %identity.id, "customer registered");
    issue(tokens, &identity, "register-success")
}

/// Create the single back-office `Owner`.
///
/// An existing Owner wins over an email clash: both report a conflict, but
/// `admin-role-error` is checked first.
pub async fn register_owner(
    identities: &dyn IdentityStore,
    tokens: &TokenService,
    name: &str,
    email: &str,
    password: &str,
) -> AppResult<AuthResponse> {
    let name = require_name(name)?;
    let email = require_email(email)?;
    policy_checked(password)?;

    if identities.owner_exists().await? {
        return Err(AppError::Conflict("admin-role-error".into()));
    }
    if identities
        .find_by_email(Realm::Admin, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("email-exist-error".into()));
    }

    // A concurrent registration surfaces here as a store conflict.
    let identity = identities
        .create(NewIdentity {
            realm: Realm::Admin,
            email,
            password_hash: hash_password(password)?,
            name,
            role: Role::Owner,
            status: AccountStatus::Active,
            cover: None,
            phone: None,
            gender: None,
            about: None,
        })
        .await?;
    info!(user_id = %identity.id, "owner registered");
    issue(tokens, &identity, "register-success")
}

/// Authenticate with email + password in `realm`.
///
/// With `disclose_reason` unset, an unknown email and a wrong password are
/// indistinguishable to the caller.
pub async fn login(
    identities: &dyn IdentityStore,
    tokens: &TokenService,
    realm: Realm,
    email: &str,
    password: &str,
    disclose_reason: bool,
) -> AppResult<AuthResponse> {
    let rejected = |code: &str| {
        let code = if disclose_reason {
            code
        } else {
            "invalid-credentials-error"
        };
        AppError::Unauthenticated(code.into())
    };

    let email = normalize_email(email);
    let Some(identity) = identities.find_by_email(realm, &email).await? else {
        warn!(realm = realm.as_str(), "login for unknown email");
        return Err(rejected("invalid-email-error"));
    };
    if !verify_password(password, &identity.password_hash)? {
        warn!(realm = realm.as_str(), user_id = %identity.id, "login with wrong password");
        return Err(rejected("invalid-password-error"));
    }
    if !identity.is_active() {
        return Err(AppError::Unauthorized("account-active-error".into()));
    }
    issue(tokens, &identity, "login-success")
}

/// Reload the caller's identity and reissue a token with a fresh expiry.
pub async fn current_user(
    identities: &dyn IdentityStore,
    tokens: &TokenService,
    claims: &TokenClaims,
) -> AppResult<AuthResponse> {
    let realm = claims.role().realm();
    let identity = identities
        .find_by_email(realm, &claims.subject.email)
        .await?
        .ok_or_else(|| AppError::NotFound("user-not-found".into()))?;
    issue(tokens, &identity, "user-found")
}

/// Customer reset: the reset token's claims name the identity.
pub async fn reset_customer_password(
    identities: &dyn IdentityStore,
    tokens: &TokenService,
    token: &str,
    new_password: &str,
) -> AppResult<MessageResponse> {
    let claims = tokens
        .verify_token(token)
        .ok_or_else(|| AppError::Unauthenticated(rejection_code(token).into()))?;
    policy_checked(new_password)?;

    let update = IdentityUpdate::password(hash_password(new_password)?);
    identities
        .update(Realm::Customer, claims.id(), update)
        .await?
        .ok_or_else(|| AppError::NotFound("user-not-found".into()))?;
    info!(user_id = claims.id(), "customer password reset");
    Ok(MessageResponse::ok("password-updated"))
}

/// Admin reset: the reset token's email names the identity.
pub async fn reset_admin_password(
    identities: &dyn IdentityStore,
    tokens: &TokenService,
    token: &str,
    new_password: &str,
) -> AppResult<MessageResponse> {
    let claims = tokens
        .verify_token(token)
        .ok_or_else(|| AppError::Unauthenticated("expired-token-error".into()))?;
    policy_checked(new_password)?;

    let identity = identities
        .find_by_email(Realm::Admin, &claims.subject.email)
        .await?
        .ok_or_else(|| AppError::NotFound("user-not-found".into()))?;
    let update = IdentityUpdate::password(hash_password(new_password)?);
    identities
        .update(Realm::Admin, &identity.id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("user-not-found".into()))?;
    info!(user_id = %identity.id, "admin password reset");
    Ok(MessageResponse::ok("new-password-created"))
}

/// Change the caller's own password after checking the old one.
pub async fn change_password(
    identities: &dyn IdentityStore,
    claims: &TokenClaims,
    id: &str,
    old_password: &str,
    new_password: &str,
) -> AppResult<MessageResponse> {
    if claims.id() != id {
        return Err(AppError::Unauthorized("not-account-owner-error".into()));
    }
    let realm = claims.role().realm();
    let identity = identities
        .find_by_id(realm, id)
        .await?
        .ok_or_else(|| AppError::NotFound("user-not-found".into()))?;
    if !verify_password(old_password, &identity.password_hash)? {
        return Err(AppError::Validation("old-password-incorrect".into()));
    }
    policy_checked(new_password)?;

    let update = IdentityUpdate::password(hash_password(new_password)?);
    identities
        .update(realm, id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("user-not-found".into()))?;
    info!(user_id = id, "password changed");
    Ok(MessageResponse::ok("password-changed"))
}

#[cfg(test)]
mod tests {
    use storefront_core::auth::memory::MemoryIdentityStore;

    use super::*;

    const PASSWORD: &str = "Password123";

    fn tokens() -> TokenService {
        TokenService::new(b"service-test-secret")
    }

    #[tokio::test]
    async fn second_owner_is_rejected() {
        let store = MemoryIdentityStore::new();
        let tokens = tokens();
        register_owner(&store, &tokens, "Owner", "owner@example.com", PASSWORD)
            .await
            .unwrap();
        let err = register_owner(&store, &tokens, "Other", "other@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "admin-role-error"));
    }

    #[tokio::test]
    async fn weak_password_is_refused() {
        let store = MemoryIdentityStore::new();
        let err = register_customer(&store, &tokens(), "Ann", "ann@example.com", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "password-policy-error"));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable_by_default() {
        let store = MemoryIdentityStore::new();
        let tokens = tokens();
        register_customer(&store, &tokens, "Ann", "ann@example.com", PASSWORD)
            .await
            .unwrap();

        let unknown = login(&store, &tokens, Realm::Customer, "bob@example.com", PASSWORD, false)
            .await
            .unwrap_err();
        let wrong = login(&store, &tokens, Realm::Customer, "ann@example.com", "Wrong1234", false)
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());

        let disclosed = login(&store, &tokens, Realm::Customer, "ann@example.com", "Wrong1234", true)
            .await
            .unwrap_err();
        assert!(matches!(disclosed, AppError::Unauthenticated(ref m) if m == "invalid-password-error"));
    }

    #[tokio::test]
    async fn login_normalizes_email_and_issues_token() {
        let store = MemoryIdentityStore::new();
        let tokens = tokens();
        register_customer(&store, &tokens, "Ann", "Ann@Example.com", PASSWORD)
            .await
            .unwrap();
        let resp = login(&store, &tokens, Realm::Customer, " ann@example.COM ", PASSWORD, false)
            .await
            .unwrap();
        assert_eq!(resp.message, "login-success");
        let claims = tokens.verify_token(&resp.token).unwrap();
        assert_eq!(claims.subject.email, "ann@example.com");
        assert_eq!(claims.role(), Role::User);
    }

    #[tokio::test]
    async fn inactive_admin_cannot_log_in() {
        let store = MemoryIdentityStore::new();
        let tokens = tokens();
        let owner = register_owner(&store, &tokens, "Owner", "owner@example.com", PASSWORD)
            .await
            .unwrap();
        store
            .update(
                Realm::Admin,
                &owner.user.id,
                IdentityUpdate {
                    status: Some(AccountStatus::Inactive),
                    ..IdentityUpdate::default()
                },
            )
            .await
            .unwrap();
        let err = login(&store, &tokens, Realm::Admin, "owner@example.com", PASSWORD, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "account-active-error"));
    }

    #[tokio::test]
    async fn change_password_checks_owner_and_old_password() {
        let store = MemoryIdentityStore::new();
        let tokens = tokens();
        let resp = register_customer(&store, &tokens, "Ann", "ann@example.com", PASSWORD)
            .await
            .unwrap();
        let claims = tokens.verify_token(&resp.token).unwrap();

        let err = change_password(&store, &claims, "someone-else", PASSWORD, "Newpass123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = change_password(&store, &claims, &resp.user.id, "Wrong1234", "Newpass123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "old-password-incorrect"));

        let ok = change_password(&store, &claims, &resp.user.id, PASSWORD, "Newpass123")
            .await
            .unwrap();
        assert_eq!(ok.message, "password-changed");
        login(&store, &tokens, Realm::Customer, "ann@example.com", "Newpass123", false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn customer_reset_rejects_garbage_token() {
        let store = MemoryIdentityStore::new();
        let err = reset_customer_password(&store, &tokens(), "not-a-token", "Newpass123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(ref m) if m == "invalid-token"));
    }
}
