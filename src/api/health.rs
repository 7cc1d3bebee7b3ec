//! Health endpoint.

use axum::{extract::State, Json};

use super::AppState;
use crate::models::{HealthResponse, UpstreamKeyStatus};

/// Handler for GET /api/health
///
/// Reports which upstream keys are configured (never their values) and the
/// current cache counters.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let keys = &state.config.api_keys;
    let upstream_keys = UpstreamKeyStatus::from_presence(
        keys.rocketx().is_some(),
        keys.moralis().is_some(),
        keys.coingecko().is_some(),
    );
    let stats = state.cache.read().await.stats();

    Json(HealthResponse::healthy(upstream_keys, stats))
}
