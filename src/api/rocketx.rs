//! Swap/bridge aggregator routes.
//!
//! All calls carry the server key in the `x-api` header. Configs, token
//! lists, network-name quotations and status lookups are cached; address
//! quotations and swap execution are not.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::pipeline::{
    endpoint, fetch, fetch_cached, invalid_query, parse_body, require_key, require_params, short,
    Fetched, DEFAULT_TIMEOUT, SWAP_TIMEOUT,
};
use super::AppState;
use crate::cache::{CacheKey, CachePolicy, CONFIGS_TTL, QUOTATION_TTL, TOKENS_TTL};
use crate::config::ROCKETX_KEY_VAR;
use crate::error::{ErrorContext, ProxyError, Result, UpstreamError};
use crate::models::{
    with_cached_flag, QuotationQuery, QuoteRequest, StatusQuery, SwapRequest, TokensQuery,
};
use crate::upstream::{RetryPolicy, UpstreamRequest};
use crate::validate::{
    is_valid_address, is_valid_amount, is_valid_chain_id, parse_chain_id, Amount,
};

/// Largest page the token list endpoint accepts
pub const MAX_TOKENS_PER_PAGE: u32 = 600;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
const API_KEY_HEADER: &str = "x-api";
const TIMEOUT_MESSAGE: &str = "Request timeout - RocketX API is slow";

const CONFIGS: ErrorContext = ErrorContext::new(
    "RocketX",
    "Failed to fetch configs from RocketX",
    TIMEOUT_MESSAGE,
);
const QUOTATION: ErrorContext = ErrorContext::new(
    "RocketX",
    "Failed to fetch quotation from RocketX",
    TIMEOUT_MESSAGE,
);
const QUOTE: ErrorContext = ErrorContext::new(
    "RocketX",
    "Failed to fetch quote from RocketX",
    TIMEOUT_MESSAGE,
);
const STATUS: ErrorContext = ErrorContext::new(
    "RocketX",
    "Failed to fetch transaction status",
    TIMEOUT_MESSAGE,
);
const TOKENS: ErrorContext = ErrorContext::new(
    "RocketX",
    "Failed to fetch tokens from RocketX",
    TIMEOUT_MESSAGE,
);

fn api_key(state: &AppState) -> Result<String> {
    require_key(state.config.api_keys.rocketx(), ROCKETX_KEY_VAR)
}

fn upstream_get(
    state: &AppState,
    path: &str,
    params: &[(&str, String)],
) -> Result<UpstreamRequest> {
    let key = api_key(state)?;
    let mut url = endpoint(&state.config.rocketx_base_url, path)?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(UpstreamRequest::get(url)
        .header(API_KEY_HEADER, key)
        .policy(RetryPolicy::idempotent(DEFAULT_TIMEOUT)))
}

/// Blank query values count as absent so route defaults apply.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// == Configs ==

/// Handler for GET /api/rocketx/configs
///
/// Cache hits report how old the cached copy is in `cache_age_seconds`.
pub async fn configs_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    let request = upstream_get(&state, "/v1/configs", &[])?;
    let key = CacheKey::new("rocketx:configs", std::iter::empty::<(&str, &str)>());

    let fetched = fetch_cached(&state, key, CachePolicy::Fixed(CONFIGS_TTL), &request)
        .await
        .map_err(|e| ProxyError::from_upstream(e, &CONFIGS))?;

    let age = match &fetched {
        Fetched::Hit(entry) => Some(entry.age_secs()),
        Fetched::Fresh(data) => {
            let networks = data
                .get("supported_network")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            info!(networks, "loaded network configuration");
            None
        }
    };

    let mut body = fetched.into_body();
    if let (Some(age), Some(map)) = (age, body.as_object_mut()) {
        map.insert("cache_age_seconds".to_string(), json!(age));
    }
    Ok(Json(body))
}

// == Quotation by network name (GET) ==

/// Handler for GET /api/rocketx/quotation (also GET /api/rocketx/quote)
///
/// Tokens are addresses or `null` for native coins; networks are names such
/// as `ethereum`. `slippage` defaults to 1.
pub async fn quotation_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<QuotationQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query.map_err(invalid_query)?;
    require_params(&[
        ("fromToken", query.from_token.as_deref()),
        ("fromNetwork", query.from_network.as_deref()),
        ("toToken", query.to_token.as_deref()),
        ("toNetwork", query.to_network.as_deref()),
        ("amount", query.amount.as_deref()),
    ])?;

    let amount = query.amount.unwrap_or_default();
    if !is_valid_amount(&Amount::Text(amount.clone())) {
        return Err(ProxyError::Validation("Invalid amount format".to_string()));
    }

    let mut params = vec![
        ("fromToken", query.from_token.unwrap_or_default()),
        ("fromNetwork", query.from_network.unwrap_or_default()),
        ("toToken", query.to_token.unwrap_or_default()),
        ("toNetwork", query.to_network.unwrap_or_default()),
        ("amount", amount),
        ("slippage", non_empty(query.slippage).unwrap_or_else(|| "1".to_string())),
    ];
    if let Some(exchanges) = non_empty(query.included_exchanges) {
        params.push(("includedExchanges", exchanges));
    }

    let request = upstream_get(&state, "/v1/quotation", &params)?;
    let key = CacheKey::new("rocketx:quotation", params.iter().cloned());

    let fetched = fetch_cached(&state, key, CachePolicy::Fixed(QUOTATION_TTL), &request)
        .await
        .map_err(|e| ProxyError::from_upstream(e, &QUOTATION))?;

    info!(
        from = %params[1].1,
        to = %params[3].1,
        cached = fetched.is_hit(),
        "served quotation"
    );
    Ok(Json(fetched.into_body()))
}

// == Quotation by token address (POST) ==

fn require_chain_id(raw: &str, field: &str) -> Result<()> {
    match parse_chain_id(raw) {
        Some(id) if is_valid_chain_id(id) => Ok(()),
        _ => Err(ProxyError::Validation(format!("Invalid {} format", field))),
    }
}

/// Handler for POST /api/rocketx/quote
///
/// Not cached. Chain ids are hex strings such as `0x1`.
pub async fn quote_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let req: QuoteRequest = parse_body(&body)?;
    let amount = req.amount.as_ref().map(Amount::to_wire);
    require_params(&[
        ("fromTokenAddress", req.from_token_address.as_deref()),
        ("toTokenAddress", req.to_token_address.as_deref()),
        ("amount", amount.as_deref()),
        ("fromTokenChainId", req.from_token_chain_id.as_deref()),
        ("toTokenChainId", req.to_token_chain_id.as_deref()),
    ])?;

    let from_token = req.from_token_address.unwrap_or_default();
    let to_token = req.to_token_address.unwrap_or_default();
    let from_chain = req.from_token_chain_id.unwrap_or_default();
    let to_chain = req.to_token_chain_id.unwrap_or_default();

    if !is_valid_address(&from_token) {
        return Err(ProxyError::Validation("Invalid fromTokenAddress format".to_string()));
    }
    if !is_valid_address(&to_token) {
        return Err(ProxyError::Validation("Invalid toTokenAddress format".to_string()));
    }
    if let Some(referrer) = req.referrer.as_deref() {
        if !is_valid_address(referrer) {
            return Err(ProxyError::Validation("Invalid referrer address format".to_string()));
        }
    }
    if !req.amount.as_ref().is_some_and(is_valid_amount) {
        return Err(ProxyError::Validation("Invalid amount format".to_string()));
    }
    require_chain_id(&from_chain, "fromTokenChainId")?;
    require_chain_id(&to_chain, "toTokenChainId")?;

    let key = api_key(&state)?;
    let payload = json!({
        "fromTokenAddress": from_token,
        "toTokenAddress": to_token,
        "amount": amount.unwrap_or_default(),
        "fromTokenChainId": from_chain,
        "toTokenChainId": to_chain,
        "slippage": req.slippage.unwrap_or(1.0),
        "referrer": req.referrer.unwrap_or_else(|| ZERO_ADDRESS.to_string()),
        "partnerId": req.partner_id.unwrap_or_else(|| state.config.partner_id.clone()),
    });

    info!(
        from = %short(&from_token),
        to = %short(&to_token),
        from_chain = %from_chain,
        to_chain = %to_chain,
        "fetching quotation"
    );

    let url = endpoint(&state.config.rocketx_base_url, "/rocketx/v1/quote")?;
    let request = UpstreamRequest::post_json(url, payload)
        .header(API_KEY_HEADER, key)
        .policy(RetryPolicy::idempotent(DEFAULT_TIMEOUT));

    let data = fetch(&state, &request)
        .await
        .map_err(|e| ProxyError::from_upstream(e, &QUOTE))?;
    Ok(Json(data))
}

// == Swap execution ==

/// Error mapping for swap execution. A timeout here does not mean the swap
/// failed, so the client is pointed at the status route.
fn classify_swap(err: UpstreamError) -> ProxyError {
    match err {
        UpstreamError::Timeout { .. } => ProxyError::Timeout(
            "Swap timeout - transaction may still be processing. Check status with requestId."
                .to_string(),
        ),
        UpstreamError::Status { status: 429, .. } => ProxyError::RateLimited,
        UpstreamError::Status { status, body } => {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .or_else(|| v.get("error"))
                        .and_then(Value::as_str)
                        .map(str::to_owned)
                })
                .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
            ProxyError::Upstream {
                status,
                message: format!("Swap failed: {}", detail),
            }
        }
        UpstreamError::Network(_) | UpstreamError::Parse(_) => {
            ProxyError::Unknown("Failed to execute swap".to_string())
        }
    }
}

/// Handler for POST /api/rocketx/swap
///
/// Tokens are the aggregator's numeric ids (resolve them through the token
/// list first). Sent exactly once: no retries and no caching, since a
/// repeated request could execute twice.
pub async fn swap_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let req: SwapRequest = parse_body(&body)?;
    let from_id = req.from_token_id.filter(|id| *id != 0);
    let to_id = req.to_token_id.filter(|id| *id != 0);
    let amount = req.from_token_amount.as_ref().map(Amount::to_wire);

    let from_id_text = from_id.map(|id| id.to_string());
    let to_id_text = to_id.map(|id| id.to_string());
    require_params(&[
        ("fromTokenId", from_id_text.as_deref()),
        ("toTokenId", to_id_text.as_deref()),
        ("fromTokenAmount", amount.as_deref()),
        ("userAddress", req.user_address.as_deref()),
    ])?;

    let user = req.user_address.unwrap_or_default();
    if !is_valid_address(&user) {
        return Err(ProxyError::Validation("Invalid userAddress format".to_string()));
    }
    if let Some(referrer) = req.referrer.as_deref() {
        if !is_valid_address(referrer) {
            return Err(ProxyError::Validation("Invalid referrer address format".to_string()));
        }
    }
    if !req.from_token_amount.as_ref().is_some_and(is_valid_amount) {
        return Err(ProxyError::Validation("Invalid fromTokenAmount format".to_string()));
    }

    let key = api_key(&state)?;
    let payload = json!({
        "fromTokenId": from_id,
        "toTokenId": to_id,
        "fromTokenAmount": req.from_token_amount.as_ref().map(Amount::to_json),
        "slippage": req.slippage.unwrap_or(1.0),
        "userAddress": user,
        "referrer": req.referrer.unwrap_or_else(|| ZERO_ADDRESS.to_string()),
        "partnerId": req.partner_id.unwrap_or_else(|| state.config.partner_id.clone()),
    });

    info!(
        from_token_id = from_id.unwrap_or_default(),
        to_token_id = to_id.unwrap_or_default(),
        user = %short(&user),
        "executing swap"
    );

    let url = endpoint(&state.config.rocketx_base_url, "/v1/swap")?;
    let request = UpstreamRequest::post_json(url, payload)
        .header(API_KEY_HEADER, key)
        .policy(RetryPolicy::no_retry(SWAP_TIMEOUT));

    let data = fetch(&state, &request).await.map_err(classify_swap)?;

    let request_id = data.get("requestId").cloned().unwrap_or_default();
    info!(
        request_id = %request_id,
        has_transaction_data = data.get("transactionData").is_some(),
        "swap submitted"
    );
    Ok(Json(data))
}

// == Status ==

/// Human-readable sentence for a `(status, subState)` pair.
pub fn status_explanation(status: &str, sub_state: &str) -> &'static str {
    match status {
        "success" => "✅ Transaction completed successfully",
        "failed" => "❌ Transaction failed",
        "pending" => match sub_state {
            "transaction_pending" => "Request ID generated - awaiting deposit",
            "pending" => "Pending receiving deposit from user",
            "approved" => "Deposit received - preparing swap",
            "executed" => "Swap completed on source chain",
            "withdrawal" => "Withdrawal initiated to destination",
            "withdraw_success" => "✅ Complete! Tokens transferred successfully",
            "invalid" => "❌ Transaction timed out or failed",
            _ => "Transaction in progress",
        },
        _ => "Unknown status",
    }
}

/// Handler for GET /api/rocketx/status
///
/// Pending results are cached for 30s; `success`/`failed` for an hour.
pub async fn status_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<StatusQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query.map_err(invalid_query)?;
    require_params(&[("requestId", query.request_id.as_deref())])?;

    let mut params = vec![("requestId", query.request_id.unwrap_or_default())];
    if let Some(tx_id) = non_empty(query.tx_id) {
        params.push(("txId", tx_id));
    }

    let request = upstream_get(&state, "/v1/status", &params)?;
    let key = CacheKey::new("rocketx:status", params.iter().cloned());

    let fetched = fetch_cached(&state, key, CachePolicy::transaction_status(), &request)
        .await
        .map_err(|e| ProxyError::from_upstream(e, &STATUS))?;

    let (data, cached) = fetched.into_parts();
    let status = data.get("status").and_then(Value::as_str).unwrap_or_default();
    let sub_state = data.get("subState").and_then(Value::as_str).unwrap_or_default();
    let explanation = status_explanation(status, sub_state);

    info!(
        request_id = %params[0].1,
        status,
        sub_state,
        cached,
        "served transaction status"
    );

    let mut body = with_cached_flag(data, cached);
    if let Some(map) = body.as_object_mut() {
        map.insert("statusExplanation".to_string(), json!(explanation));
    }
    Ok(Json(body))
}

// == Token list ==

fn parse_positive(raw: &str, name: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ProxyError::Validation(format!("{} must be a positive integer", name)))
}

/// Handler for GET /api/rocketx/tokens
///
/// `page` defaults to 1, `perPage` to 100 (max 600), `keyword` to `All`.
pub async fn tokens_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<TokensQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query.map_err(invalid_query)?;
    let chain_id = match non_empty(query.chain_id) {
        Some(chain_id) => chain_id,
        None => {
            return Err(ProxyError::Validation(
                "Missing required parameter: chainId (e.g., \"0x1\" for Ethereum)".to_string(),
            ))
        }
    };
    require_chain_id(&chain_id, "chainId")?;

    let page = non_empty(query.page).unwrap_or_else(|| "1".to_string());
    let per_page = non_empty(query.per_page).unwrap_or_else(|| "100".to_string());
    parse_positive(&page, "page")?;
    if parse_positive(&per_page, "perPage")? > MAX_TOKENS_PER_PAGE {
        return Err(ProxyError::Validation(format!(
            "perPage exceeds maximum of {}",
            MAX_TOKENS_PER_PAGE
        )));
    }

    let params = vec![
        ("chainId", chain_id),
        ("page", page),
        ("perPage", per_page),
        ("keyword", non_empty(query.keyword).unwrap_or_else(|| "All".to_string())),
    ];

    let request = upstream_get(&state, "/v1/tokens", &params)?;
    let key = CacheKey::new("rocketx:tokens", params.iter().cloned());

    let fetched = fetch_cached(&state, key, CachePolicy::Fixed(TOKENS_TTL), &request)
        .await
        .map_err(|e| ProxyError::from_upstream(e, &TOKENS))?;

    if let Fetched::Fresh(data) = &fetched {
        let count = data
            .get("tokens")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        info!(chain_id = %params[0].1, page = %params[1].1, count, "loaded tokens");
    }
    Ok(Json(fetched.into_body()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_explanations() {
        assert_eq!(
            status_explanation("success", "withdraw_success"),
            "✅ Transaction completed successfully"
        );
        assert_eq!(status_explanation("failed", ""), "❌ Transaction failed");
        assert_eq!(
            status_explanation("pending", "approved"),
            "Deposit received - preparing swap"
        );
        assert_eq!(
            status_explanation("pending", "something_new"),
            "Transaction in progress"
        );
        assert_eq!(status_explanation("", ""), "Unknown status");
    }

    #[test]
    fn test_swap_timeout_points_to_status() {
        let err = classify_swap(UpstreamError::Timeout { timeout_ms: 30_000 });
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.to_string().contains("Check status with requestId"));
    }

    #[test]
    fn test_swap_error_detail_from_json_body() {
        let err = classify_swap(UpstreamError::Status {
            status: 400,
            body: r#"{"message":"Insufficient liquidity"}"#.to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Swap failed: Insufficient liquidity");
    }

    #[test]
    fn test_swap_error_detail_from_text_body() {
        let err = classify_swap(UpstreamError::Status {
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Swap failed: HTTP 500: boom");
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("600", "perPage").unwrap(), 600);
        assert!(parse_positive("0", "perPage").is_err());
        assert!(parse_positive("abc", "page").is_err());
        assert!(parse_positive("-1", "page").is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("2".to_string())), Some("2".to_string()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_require_chain_id() {
        assert!(require_chain_id("0x1", "fromTokenChainId").is_ok());
        assert!(require_chain_id("137", "fromTokenChainId").is_ok());
        assert_eq!(
            require_chain_id("ethereum", "toTokenChainId")
                .unwrap_err()
                .to_string(),
            "Invalid toTokenChainId format"
        );
    }
}
