//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health`: crate version and store reachability.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = state.stores.identities.ping().await;
    if !store_connected {
        warn!("health check: store unreachable");
    }
    Json(HealthResponse {
        status: if store_connected { "ok" } else { "degraded" },
        version: storefront_core::version(),
        store_connected,
    })
}
