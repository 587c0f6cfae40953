//! API server configuration.

use storefront_core::auth::jwt::resolve_jwt_secret;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Report `invalid-email-error` / `invalid-password-error` instead of the
    /// single `invalid-credentials-error` on failed logins.
    pub disclose_login_failure_reason: bool,
    /// Validity of issued codes when an order line names none.
    pub default_code_validity_days: Option<u32>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                        | Default                               |
    /// |---------------------------------|---------------------------------------|
    /// | `BIND_ADDR`                     | `127.0.0.1:3100`                      |
    /// | `DATABASE_URL`                  | `postgres://localhost:5432/storefront`|
    /// | `JWT_SECRET` / `AUTH_SECRET`    | generated & persisted to file         |
    /// | `DISCLOSE_LOGIN_FAILURE_REASON` | `false`                               |
    /// | `DEFAULT_CODE_VALIDITY_DAYS`    | unset (codes never expire)            |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/storefront".into()),
            jwt_secret: resolve_jwt_secret(),
            disclose_login_failure_reason: std::env::var("DISCLOSE_LOGIN_FAILURE_REASON")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            default_code_validity_days: std::env::var("DEFAULT_CODE_VALIDITY_DAYS")
                .ok()
                .and_then(|v| parse_validity_days(&v)),
        }
    }

    /// Configuration for tests and in-process embedding.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: String::new(),
            jwt_secret: jwt_secret.into(),
            disclose_login_failure_reason: false,
            default_code_validity_days: None,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_validity_days(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|days| *days > 0)
}
