//! Price oracle routes.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
};
use tracing::info;

use super::pipeline::{
    endpoint, fetch_cached, invalid_query, json_with_cache_control, require_key, require_params,
    PRICE_TIMEOUT,
};
use super::AppState;
use crate::cache::{CacheKey, CachePolicy, PRICE_TTL};
use crate::config::COINGECKO_KEY_VAR;
use crate::error::{ErrorContext, ProxyError, Result};
use crate::models::PriceQuery;
use crate::upstream::{RetryPolicy, UpstreamRequest};

const COINGECKO: ErrorContext = ErrorContext::new(
    "CoinGecko",
    "Failed to fetch prices from CoinGecko",
    "Request timeout - CoinGecko API is slow",
);

/// Handler for GET /api/coingecko/simple/price
///
/// `ids` is required; the `include_*` flags default to `true` and
/// `vs_currencies` to `usd`. The key is sent as `x_cg_demo_api_key`.
pub async fn price_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<PriceQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(invalid_query)?;
    require_params(&[("ids", query.ids.as_deref())])?;

    let params = [
        ("ids", query.ids.unwrap_or_default()),
        ("vs_currencies", query.vs_currencies.unwrap_or_else(|| "usd".to_string())),
        (
            "include_24hr_change",
            query.include_24hr_change.unwrap_or_else(|| "true".to_string()),
        ),
        (
            "include_market_cap",
            query.include_market_cap.unwrap_or_else(|| "true".to_string()),
        ),
        (
            "include_24hr_vol",
            query.include_24hr_vol.unwrap_or_else(|| "true".to_string()),
        ),
    ];

    let api_key = require_key(state.config.api_keys.coingecko(), COINGECKO_KEY_VAR)?;

    let mut url = endpoint(&state.config.coingecko_base_url, "/simple/price")?;
    url.query_pairs_mut()
        .extend_pairs(&params)
        .append_pair("x_cg_demo_api_key", &api_key);

    let request = UpstreamRequest::get(url).policy(RetryPolicy::idempotent(PRICE_TIMEOUT));
    let policy = CachePolicy::Fixed(PRICE_TTL);
    let key = CacheKey::new("coingecko:price", params.iter().cloned());

    let fetched = fetch_cached(&state, key, policy, &request)
        .await
        .map_err(|e| ProxyError::from_upstream(e, &COINGECKO))?;

    info!(ids = %params[0].1, cached = fetched.is_hit(), "served prices");
    Ok(json_with_cache_control(fetched.into_body(), policy.nominal()))
}
