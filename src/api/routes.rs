//! API Routes
//!
//! Configures the Axum router with every proxy endpoint.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::coingecko::price_handler;
use super::cors::apply_cors;
use super::health::health_handler;
use super::moralis::wallet_tokens_handler;
use super::pipeline::{get_only, get_or_post_only, not_found, post_only};
use super::rocketx::{
    configs_handler, quotation_handler, quote_handler, status_handler, swap_handler,
    tokens_handler,
};
use super::AppState;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: answers preflight with 204 and decorates every response,
///   including 404/405 and error bodies
/// - Tracing: logs all requests
pub fn create_router(state: AppState) -> Router {
    let origin_policy = state.config.origin_policy.clone();

    Router::new()
        .route(
            "/api/coingecko/simple/price",
            get(price_handler).fallback(get_only),
        )
        .route(
            "/api/moralis/wallets/:address/tokens",
            get(wallet_tokens_handler).fallback(get_only),
        )
        .route(
            "/api/rocketx/configs",
            get(configs_handler).fallback(get_only),
        )
        .route(
            "/api/rocketx/quote",
            get(quotation_handler)
                .post(quote_handler)
                .fallback(get_or_post_only),
        )
        .route(
            "/api/rocketx/quotation",
            get(quotation_handler).fallback(get_only),
        )
        .route("/api/rocketx/swap", post(swap_handler).fallback(post_only))
        .route("/api/rocketx/status", get(status_handler).fallback(get_only))
        .route("/api/rocketx/tokens", get(tokens_handler).fallback(get_only))
        .route("/api/health", get(health_handler).fallback(get_only))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(origin_policy, apply_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
