//! Error types for the proxy
//!
//! Two layers, both built on thiserror:
//! - [`UpstreamError`] describes what went wrong talking to a third-party API.
//! - [`ProxyError`] is what a route hands back to the browser client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Upstream Error Enum ==
/// Failure of a single outbound call after the retry budget is spent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// The attempt exceeded its deadline and was aborted
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection-level failure (DNS, reset, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose body is not valid JSON
    #[error("Invalid JSON from upstream: {0}")]
    Parse(String),
}

// == Proxy Error Enum ==
/// Unified client-facing error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    /// Bad or missing client input
    #[error("{0}")]
    Validation(String),

    /// Server-side credential is not configured
    #[error("Server configuration error")]
    Configuration,

    /// HTTP method not accepted by the route
    #[error("{0}")]
    MethodNotAllowed(String),

    /// No route matches the request path
    #[error("Not found")]
    NotFound,

    /// Upstream call timed out
    #[error("{0}")]
    Timeout(String),

    /// Upstream returned 429
    #[error("Rate limit exceeded - please try again later")]
    RateLimited,

    /// Upstream returned another non-2xx status, passed through as-is
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Catch-all naming the failed operation
    #[error("{0}")]
    Unknown(String),
}

/// Per-route wording used when turning an [`UpstreamError`] into a [`ProxyError`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext {
    /// Display name of the upstream, e.g. "RocketX"
    pub upstream: &'static str,
    /// Message for the catch-all case, e.g. "Failed to fetch prices from CoinGecko"
    pub failure: &'static str,
    /// Message for the timeout case
    pub timeout: &'static str,
}

impl ErrorContext {
    pub const fn new(
        upstream: &'static str,
        failure: &'static str,
        timeout: &'static str,
    ) -> Self {
        Self {
            upstream,
            failure,
            timeout,
        }
    }
}

impl ProxyError {
    // == Classification ==
    /// Maps a transport failure onto the client-facing taxonomy.
    ///
    /// - timeout → 504
    /// - upstream 429 → 429
    /// - other upstream status → same status, message embeds status and body
    /// - anything else → 500 naming the failed operation
    pub fn from_upstream(err: UpstreamError, ctx: &ErrorContext) -> Self {
        match err {
            UpstreamError::Timeout { .. } => ProxyError::Timeout(ctx.timeout.to_string()),
            UpstreamError::Status { status: 429, .. } => ProxyError::RateLimited,
            UpstreamError::Status { status, body } => ProxyError::Upstream {
                status,
                message: format!("{} API error: HTTP {}: {}", ctx.upstream, status, body),
            },
            UpstreamError::Network(_) | UpstreamError::Parse(_) => {
                ProxyError::Unknown(ctx.failure.to_string())
            }
        }
    }

    // == Status Code ==
    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::new(self.to_string(), status.as_u16()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for route handlers.
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: ErrorContext = ErrorContext::new(
        "RocketX",
        "Failed to fetch tokens from RocketX",
        "Request timeout - RocketX API is slow",
    );

    #[test]
    fn test_timeout_maps_to_504() {
        let err = ProxyError::from_upstream(UpstreamError::Timeout { timeout_ms: 15000 }, &CTX);
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.to_string(), "Request timeout - RocketX API is slow");
    }

    #[test]
    fn test_429_maps_to_rate_limited() {
        let err = ProxyError::from_upstream(
            UpstreamError::Status {
                status: 429,
                body: "slow down".to_string(),
            },
            &CTX,
        );
        assert_eq!(err, ProxyError::RateLimited);
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_other_status_is_passed_through() {
        let err = ProxyError::from_upstream(
            UpstreamError::Status {
                status: 404,
                body: "{\"message\":\"not found\"}".to_string(),
            },
            &CTX,
        );
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "RocketX API error: HTTP 404: {\"message\":\"not found\"}"
        );
    }

    #[test]
    fn test_network_and_parse_fall_back_to_500() {
        for upstream in [
            UpstreamError::Network("connection reset".to_string()),
            UpstreamError::Parse("expected value".to_string()),
        ] {
            let err = ProxyError::from_upstream(upstream, &CTX);
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.to_string(), "Failed to fetch tokens from RocketX");
        }
    }

    #[test]
    fn test_configuration_error_message() {
        let err = ProxyError::Configuration;
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Server configuration error");
    }

    #[test]
    fn test_invalid_upstream_status_becomes_bad_gateway() {
        let err = ProxyError::Upstream {
            status: 42,
            message: "weird".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
