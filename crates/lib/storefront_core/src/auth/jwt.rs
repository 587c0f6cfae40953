//! Session-token issuance and verification (HS256, 7-day expiry).
//!
//! [`TokenService::verify_token`] is the only check that may authorize a
//! request. [`decode_token`] and [`is_token_expired`] skip the signature and
//! exist to tell "expired" apart from "invalid" when reporting errors.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::AuthError;
use crate::models::claims::{TokenClaims, TokenSubject};

/// Session token lifetime: 7 days.
pub const TOKEN_EXPIRY_DAYS: i64 = 7;

/// Scheme prefix stripped from the `Authorization` header.
const BEARER_PREFIX: &str = "Bearer ";

/// Signs and verifies session tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `subject`, valid for seven days from now.
    pub fn generate_token(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.generate_token_at(subject, Utc::now())
    }

    /// Issue a token as if signed at `issued_at`.
    pub fn generate_token_at(
        &self,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            subject: subject.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::days(TOKEN_EXPIRY_DAYS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    /// Verify signature and expiry. Returns `None` for any failure.
    pub fn verify_token(&self, token: &str) -> Option<TokenClaims> {
        match decode::<TokenClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                warn!(error = %e, "session token verification failed");
                None
            }
        }
    }
}

/// Decode a token's claims WITHOUT checking the signature or expiry.
pub fn decode_token(token: &str) -> Option<TokenClaims> {
    decode_unverified(token)
}

/// True when the token's `exp` is in the past, or the token cannot be decoded.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now())
}

pub fn is_token_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    #[derive(Deserialize)]
    struct ExpiryOnly {
        exp: Option<i64>,
    }

    match decode_unverified::<ExpiryOnly>(token) {
        Some(ExpiryOnly { exp: Some(exp) }) => exp < now.timestamp(),
        _ => true,
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix(BEARER_PREFIX)
}

fn decode_unverified<T: DeserializeOwned>(token: &str) -> Option<T> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    match decode::<T>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            warn!(error = %e, "session token decoding failed");
            None
        }
    }
}

/// Resolve the signing secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path = %parent.display(), error = %e, "could not create secret directory");
    }
    match std::fs::write(&secret_path, &secret) {
        Ok(()) => info!(path = %secret_path.display(), "generated new JWT secret"),
        Err(e) => warn!(
            path = %secret_path.display(),
            error = %e,
            "generated JWT secret could not be persisted; tokens will not survive a restart"
        ),
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storefront")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::{AccountStatus, Cover, Role};

    const SECRET: &[u8] = b"test-secret";

    fn subject() -> TokenSubject {
        TokenSubject {
            id: "0192f0c4-0000-7000-8000-000000000001".into(),
            email: "shopper@example.com".into(),
            name: "Shopper".into(),
            cover: Some(Cover {
                id: "avatar-1".into(),
                url: "https://cdn.example.com/avatar-1.png".into(),
                blur_data_url: None,
            }),
            status: AccountStatus::Active,
            role: Role::User,
        }
    }

    #[test]
    fn round_trip_returns_the_subject() {
        let svc = TokenService::new(SECRET);
        let token = svc.generate_token(&subject()).unwrap();
        let claims = svc.verify_token(&token).expect("fresh token verifies");
        assert_eq!(claims.subject, subject());
        assert_eq!(claims.exp - claims.iat, TOKEN_EXPIRY_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn cover_is_optional() {
        let svc = TokenService::new(SECRET);
        let mut s = subject();
        s.cover = None;
        let token = svc.generate_token(&s).unwrap();
        assert_eq!(svc.verify_token(&token).unwrap().subject, s);
    }

    #[test]
    fn token_older_than_seven_days_is_rejected() {
        let svc = TokenService::new(SECRET);
        let issued = Utc::now() - Duration::days(TOKEN_EXPIRY_DAYS) - Duration::seconds(5);
        let token = svc.generate_token_at(&subject(), issued).unwrap();
        assert!(svc.verify_token(&token).is_none());
        assert!(is_token_expired(&token));
    }

    #[test]
    fn token_just_inside_the_window_verifies() {
        let svc = TokenService::new(SECRET);
        let issued = Utc::now() - Duration::days(TOKEN_EXPIRY_DAYS) + Duration::minutes(5);
        let token = svc.generate_token_at(&subject(), issued).unwrap();
        assert!(svc.verify_token(&token).is_some());
        assert!(!is_token_expired(&token));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let svc = TokenService::new(SECRET);
        let token = svc.generate_token(&subject()).unwrap();
        let (body, sig) = token.rsplit_once('.').unwrap();
        let reversed: String = sig.chars().rev().collect();
        let tampered = format!("{body}.{reversed}");
        assert_ne!(tampered, token);
        assert!(svc.verify_token(&tampered).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenService::new(SECRET).generate_token(&subject()).unwrap();
        assert!(TokenService::new(b"other-secret").verify_token(&token).is_none());
    }

    #[test]
    fn decode_skips_signature_check() {
        let token = TokenService::new(SECRET).generate_token(&subject()).unwrap();
        let claims = decode_token(&token).expect("decodes without the secret");
        assert_eq!(claims.subject.email, "shopper@example.com");
    }

    #[test]
    fn malformed_tokens_count_as_expired() {
        assert!(is_token_expired(""));
        assert!(is_token_expired("not-a-token"));
        assert!(is_token_expired("a.b.c"));
        assert!(decode_token("not-a-token").is_none());
    }

    #[test]
    fn expiry_is_compared_against_the_given_instant() {
        let svc = TokenService::new(SECRET);
        let issued = Utc::now();
        let token = svc.generate_token_at(&subject(), issued).unwrap();
        assert!(!is_token_expired_at(&token, issued + Duration::days(6)));
        assert!(is_token_expired_at(&token, issued + Duration::days(8)));
    }

    #[test]
    fn bearer_header_extraction() {
        assert_eq!(extract_token_from_header(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(Some("abc123")), None);
        assert_eq!(extract_token_from_header(Some("bearer abc123")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
