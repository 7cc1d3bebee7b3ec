//! Balance provider routes.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Response,
};
use tracing::info;

use super::pipeline::{
    endpoint, fetch_cached, invalid_query, json_with_cache_control, require_key, short,
    BALANCES_TIMEOUT,
};
use super::AppState;
use crate::cache::{CacheKey, CachePolicy, BALANCES_TTL};
use crate::config::MORALIS_KEY_VAR;
use crate::error::{ErrorContext, ProxyError, Result, UpstreamError};
use crate::models::WalletTokensQuery;
use crate::upstream::{RetryPolicy, UpstreamRequest};
use crate::validate::{is_valid_address, resolve_moralis_chain};

const MORALIS: ErrorContext = ErrorContext::new(
    "Moralis",
    "Failed to fetch wallet tokens from Moralis",
    "Request timeout - Moralis API is slow",
);

/// Upstream 401 means our own key was rejected; say so instead of echoing the body.
fn classify(err: UpstreamError) -> ProxyError {
    match err {
        UpstreamError::Status { status: 401, .. } => ProxyError::Upstream {
            status: 401,
            message: "Moralis API authentication failed".to_string(),
        },
        other => ProxyError::from_upstream(other, &MORALIS),
    }
}

/// Handler for GET /api/moralis/wallets/:address/tokens
///
/// `chain` defaults to `eth`; chain names are mapped to hex ids.
pub async fn wallet_tokens_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
    query: std::result::Result<Query<WalletTokensQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(invalid_query)?;
    if !is_valid_address(&address) {
        return Err(ProxyError::Validation("Invalid Ethereum address".to_string()));
    }
    let chain = resolve_moralis_chain(query.chain.as_deref().unwrap_or("eth"));

    let api_key = require_key(state.config.api_keys.moralis(), MORALIS_KEY_VAR)?;

    let mut url = endpoint(
        &state.config.moralis_base_url,
        &format!("/wallets/{}/tokens", address),
    )?;
    url.query_pairs_mut().append_pair("chain", &chain);

    let request = UpstreamRequest::get(url)
        .header("X-API-Key", api_key)
        .policy(RetryPolicy::idempotent(BALANCES_TIMEOUT));
    let policy = CachePolicy::Fixed(BALANCES_TTL);
    let key = CacheKey::new(
        "moralis:tokens",
        [
            ("address", address.to_ascii_lowercase()),
            ("chain", chain.clone()),
        ],
    );

    let fetched = fetch_cached(&state, key, policy, &request)
        .await
        .map_err(classify)?;

    info!(
        wallet = %short(&address),
        chain = %chain,
        cached = fetched.is_hit(),
        "served wallet tokens"
    );
    Ok(json_with_cache_control(fetched.into_body(), policy.nominal()))
}
