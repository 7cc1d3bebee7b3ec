//! CORS envelope
//!
//! Every response, success or error, carries the CORS headers so the
//! widgets can be embedded from any origin. `OPTIONS` is answered here with
//! 204 before routing or method checks run.

use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
        },
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::OriginPolicy;

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// Writes the CORS headers for a request from `origin` into `headers`.
pub fn insert_cors_headers(headers: &mut HeaderMap, policy: &OriginPolicy, origin: Option<&str>) {
    let allow_origin = match (policy, origin) {
        (OriginPolicy::Mirror, Some(origin)) => {
            HeaderValue::from_str(origin).unwrap_or(HeaderValue::from_static("*"))
        }
        _ => HeaderValue::from_static("*"),
    };
    if *policy == OriginPolicy::Mirror {
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
}

/// Middleware: short-circuits preflight and decorates every other response.
pub async fn apply_cors(
    State(policy): State<OriginPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    insert_cors_headers(response.headers_mut(), &policy, origin.as_deref());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_echoes_origin() {
        let mut headers = HeaderMap::new();
        insert_cors_headers(&mut headers, &OriginPolicy::Mirror, Some("https://app.example"));
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example");
        assert_eq!(headers[VARY], "Origin");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
    }

    #[test]
    fn test_mirror_without_origin_is_wildcard() {
        let mut headers = HeaderMap::new();
        insert_cors_headers(&mut headers, &OriginPolicy::Mirror, None);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn test_any_ignores_origin() {
        let mut headers = HeaderMap::new();
        insert_cors_headers(&mut headers, &OriginPolicy::Any, Some("https://app.example"));
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.get(VARY).is_none());
    }
}
