//! Response DTOs for the proxy API

use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::CacheStats;

/// Adds the `cached` flag to an upstream payload.
///
/// Objects get the field merged in; any other JSON value is wrapped as
/// `{"data": value, "cached": flag}`.
pub fn with_cached_flag(value: Value, cached: bool) -> Value {
    match value {
        Value::Object(mut map) => {
            map.insert("cached".to_string(), Value::Bool(cached));
            Value::Object(map)
        }
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map.insert("cached".to_string(), Value::Bool(cached));
            Value::Object(map)
        }
    }
}

/// Error body for every failure: `{"error": message, "status": code}`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            status,
        }
    }
}

/// Whether each upstream credential is configured. Never carries the value.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamKeyStatus {
    pub rocketx: &'static str,
    pub moralis: &'static str,
    pub coingecko: &'static str,
}

impl UpstreamKeyStatus {
    pub fn from_presence(rocketx: bool, moralis: bool, coingecko: bool) -> Self {
        let label = |present: bool| if present { "SET" } else { "MISSING" };
        Self {
            rocketx: label(rocketx),
            moralis: label(moralis),
            coingecko: label(coingecko),
        }
    }
}

/// Response body for GET /api/health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub upstream_keys: UpstreamKeyStatus,
    pub cache: CacheStats,
}

impl HealthResponse {
    pub fn healthy(upstream_keys: UpstreamKeyStatus, cache: CacheStats) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            upstream_keys,
            cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cached_flag_merges_into_objects() {
        let value = with_cached_flag(json!({"bitcoin": {"usd": 1}}), true);
        assert_eq!(value, json!({"bitcoin": {"usd": 1}, "cached": true}));
    }

    #[test]
    fn test_cached_flag_wraps_arrays() {
        let value = with_cached_flag(json!([1, 2]), false);
        assert_eq!(value, json!({"data": [1, 2], "cached": false}));
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_value(ErrorResponse::new("Server configuration error", 500)).unwrap();
        assert_eq!(json, json!({"error": "Server configuration error", "status": 500}));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(
            UpstreamKeyStatus::from_presence(true, false, true),
            CacheStats::default(),
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["upstream_keys"]["moralis"], "MISSING");
        assert_eq!(json["upstream_keys"]["rocketx"], "SET");
        assert!(json.get("timestamp").is_some());
    }
}
