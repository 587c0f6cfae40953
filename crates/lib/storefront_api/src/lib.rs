//! # storefront_api
//!
//! HTTP API library for the storefront.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;
use axum::routing::{get, post, put};
use sqlx::PgPool;
use storefront_core::auth::jwt::TokenService;
use storefront_core::store::Stores;
use storefront_core::vcode::CodeEngine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::handlers::{
    admin_auth, admin_orders, auth, health, orders, reviews, users, virtual_codes,
};
use crate::middleware::route_policy::RoutePolicy;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backends.
    pub stores: Stores,
    /// Virtual code engine over `stores.codes`.
    pub codes: CodeEngine,
    /// Session-token signer and verifier.
    pub tokens: TokenService,
    /// Route perimeter.
    pub policy: RoutePolicy,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(stores: Stores, config: ApiConfig) -> Self {
        Self {
            codes: CodeEngine::new(stores.codes.clone()),
            tokens: TokenService::new(config.jwt_secret.as_bytes()),
            policy: RoutePolicy::storefront(),
            stores,
            config,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `storefront_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    storefront_core::migrate::migrate(pool).await
}

async fn not_found() -> AppError {
    AppError::NotFound("route-not-found".into())
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/reset-password", post(auth::reset_password_handler))
        .route("/api/admin/auth/register", post(admin_auth::register_handler))
        .route("/api/admin/auth/login", post(admin_auth::login_handler))
        .route(
            "/api/admin/auth/reset-password",
            post(admin_auth::reset_password_handler),
        );

    // Optional auth: claims when a valid token is sent, never rejects
    let optional = Router::new()
        .route(
            "/api/virtual-codes/{code}",
            get(virtual_codes::lookup_handler),
        )
        .route("/api/products/{id}/reviews", get(reviews::list_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_auth,
        ));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/api/auth/user", get(auth::current_user_handler))
        .route(
            "/api/users/change-password/{id}",
            put(users::change_password_handler),
        )
        .route("/api/users/profile", get(users::profile_handler))
        .route("/api/orders", post(orders::create_order_handler))
        .route(
            "/api/orders/{id}/virtual-codes",
            get(orders::list_codes_handler),
        )
        .route(
            "/api/orders/{id}/virtual-codes/{code_id}/retrieve",
            post(orders::retrieve_code_handler),
        )
        .route("/api/reviews", post(reviews::create_handler))
        .route(
            "/api/admin/orders/{id}/confirm",
            post(admin_orders::confirm_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(optional)
        .merge(protected)
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::route_policy::enforce_route_policy,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
