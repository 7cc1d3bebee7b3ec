//! Shared route pipeline
//!
//! Pieces every proxy route composes: input checks, credential lookup,
//! cache-aside upstream fetch and response construction. Preflight and the
//! CORS headers live in [`super::cors`]; method gating is done by the router.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::rejection::QueryRejection,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use super::AppState;
use crate::cache::{CacheEntry, CacheKey, CachePolicy};
use crate::error::{ProxyError, Result, UpstreamError};
use crate::models::{requests::missing_fields, with_cached_flag};
use crate::upstream::UpstreamRequest;

/// Per-attempt deadlines by upstream latency class
pub const PRICE_TIMEOUT: Duration = Duration::from_secs(10);
pub const BALANCES_TIMEOUT: Duration = Duration::from_secs(30);
pub const SWAP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

// == Input ==

/// Maps a malformed query string to a 400.
pub fn invalid_query(rejection: QueryRejection) -> ProxyError {
    ProxyError::Validation(format!("Invalid query string: {}", rejection.body_text()))
}

/// Parses a JSON body into `T`. The `Content-Type` header is not required.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| ProxyError::Validation(format!("Invalid JSON body: {}", e)))
}

/// Fails with 400 naming every missing or blank field.
pub fn require_params(fields: &[(&str, Option<&str>)]) -> Result<()> {
    let missing = missing_fields(fields);
    match missing.as_slice() {
        [] => Ok(()),
        [one] => Err(ProxyError::Validation(format!(
            "Missing required parameter: {}",
            one
        ))),
        many => Err(ProxyError::Validation(format!(
            "Missing required parameters: {}",
            many.join(", ")
        ))),
    }
}

// == Credentials ==

/// Returns the configured key or a 500. Only the variable name is logged.
pub fn require_key(key: Option<String>, env_name: &str) -> Result<String> {
    match key {
        Some(key) if !key.is_empty() => Ok(key),
        _ => {
            error!(variable = env_name, "upstream API key not configured");
            Err(ProxyError::Configuration)
        }
    }
}

/// Joins a configured base URL and an endpoint path.
pub fn endpoint(base: &str, path: &str) -> Result<Url> {
    Url::parse(&format!("{}{}", base.trim_end_matches('/'), path)).map_err(|e| {
        error!(base, path, error = %e, "invalid upstream base URL");
        ProxyError::Configuration
    })
}

// == Cache-aside fetch ==

/// Outcome of a cache-aside lookup.
#[derive(Debug, Clone)]
pub enum Fetched {
    /// Served from the cache
    Hit(CacheEntry),
    /// Fetched from upstream and stored
    Fresh(Value),
}

impl Fetched {
    pub fn is_hit(&self) -> bool {
        matches!(self, Fetched::Hit(_))
    }

    /// Payload plus whether it came from the cache.
    pub fn into_parts(self) -> (Value, bool) {
        match self {
            Fetched::Hit(entry) => (entry.value, true),
            Fetched::Fresh(value) => (value, false),
        }
    }

    /// Payload with the `cached` flag set.
    pub fn into_body(self) -> Value {
        let (value, cached) = self.into_parts();
        with_cached_flag(value, cached)
    }
}

/// Looks `key` up; on a miss calls upstream and stores the result with the
/// TTL `policy` picks for it. Failures are never cached.
pub async fn fetch_cached(
    state: &AppState,
    key: CacheKey,
    policy: CachePolicy,
    request: &UpstreamRequest,
) -> std::result::Result<Fetched, UpstreamError> {
    let hit = state.cache.write().await.get(&key);
    if let Some(entry) = hit {
        debug!(key = %key, "cache hit");
        return Ok(Fetched::Hit(entry));
    }
    debug!(key = %key, "cache miss");

    let value = fetch(state, request).await?;
    let ttl = policy.ttl_for(&value);
    state.cache.write().await.set(key, value.clone(), ttl);

    Ok(Fetched::Fresh(value))
}

/// Uncached upstream call with failure logging.
pub async fn fetch(
    state: &AppState,
    request: &UpstreamRequest,
) -> std::result::Result<Value, UpstreamError> {
    state.upstream.fetch_json(request).await.map_err(|e| {
        warn!(
            method = %request.method,
            path = request.url.path(),
            error = %e,
            "upstream call failed"
        );
        e
    })
}

// == Output ==

/// 200 JSON response with a shared-cache hint matching the route TTL.
pub fn json_with_cache_control(body: Value, max_age: Duration) -> Response {
    let secs = max_age.as_secs();
    (
        [(
            header::CACHE_CONTROL,
            format!("public, max-age={}, s-maxage={}", secs, secs),
        )],
        Json(body),
    )
        .into_response()
}

/// First 10 characters of an address, for logs.
pub fn short(address: &str) -> String {
    let head: String = address.chars().take(10).collect();
    format!("{}...", head)
}

// == Method gates ==

/// Fallback for GET-only routes.
pub async fn get_only() -> ProxyError {
    ProxyError::MethodNotAllowed("Method not allowed".to_string())
}

/// Fallback for POST-only routes.
pub async fn post_only() -> ProxyError {
    ProxyError::MethodNotAllowed("Method not allowed - use POST".to_string())
}

/// Fallback for routes taking GET or POST.
pub async fn get_or_post_only() -> ProxyError {
    ProxyError::MethodNotAllowed("Method not allowed - use GET or POST".to_string())
}

/// Fallback for unknown paths.
pub async fn not_found() -> ProxyError {
    ProxyError::NotFound
}
