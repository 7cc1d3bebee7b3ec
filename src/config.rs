//! Configuration Module
//!
//! Handles loading proxy configuration from environment variables.
//! Upstream API keys are optional at startup: a missing key only disables
//! the routes that need it (they answer 500 "Server configuration error").
//! Keys are looked up on every request, so setting or rotating one in the
//! process environment takes effect without a restart.

use std::env;

/// Default upstream base URLs
pub const ROCKETX_BASE_URL: &str = "https://api.rocketx.exchange";
pub const MORALIS_BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// How the `Access-Control-Allow-Origin` header is filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Always answer `*`
    Any,
    /// Echo the request's `Origin` header, `*` when absent
    Mirror,
}

impl OriginPolicy {
    /// Parses the `ALLOWED_ORIGINS` value. Only a literal `*` selects [`OriginPolicy::Any`].
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("*") => OriginPolicy::Any,
            _ => OriginPolicy::Mirror,
        }
    }
}

/// Environment variables holding the upstream keys
pub const ROCKETX_KEY_VAR: &str = "ROCKETX_API_KEY";
pub const MORALIS_KEY_VAR: &str = "MORALIS_API_KEY";
pub const COINGECKO_KEY_VAR: &str = "COINGECKO_API_KEY";

/// Server-held credentials, one per upstream.
///
/// A fixed value wins; otherwise, when `read_env` is set, the key is read
/// from the environment at the moment it is needed. `Debug` only reports
/// whether a key is present.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub rocketx: Option<String>,
    pub moralis: Option<String>,
    pub coingecko: Option<String>,
    pub read_env: bool,
}

impl ApiKeys {
    /// Keys resolved from the process environment on each lookup.
    pub fn from_env() -> Self {
        Self {
            read_env: true,
            ..Self::default()
        }
    }

    pub fn rocketx(&self) -> Option<String> {
        self.lookup(&self.rocketx, ROCKETX_KEY_VAR)
    }

    pub fn moralis(&self) -> Option<String> {
        self.lookup(&self.moralis, MORALIS_KEY_VAR)
    }

    pub fn coingecko(&self) -> Option<String> {
        self.lookup(&self.coingecko, COINGECKO_KEY_VAR)
    }

    fn lookup(&self, fixed: &Option<String>, var: &str) -> Option<String> {
        match normalize_secret(fixed.clone()) {
            Some(key) => Some(key),
            None if self.read_env => secret_var(var),
            None => None,
        }
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("rocketx", &self.rocketx().is_some())
            .field("moralis", &self.moralis().is_some())
            .field("coingecko", &self.coingecko().is_some())
            .finish()
    }
}

/// Proxy configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background cache sweep interval in seconds
    pub cleanup_interval: u64,
    /// Upper bound on cached responses
    pub max_cache_entries: usize,
    /// CORS origin handling
    pub origin_policy: OriginPolicy,
    /// Upstream credentials
    pub api_keys: ApiKeys,
    /// Swap/bridge aggregator base URL
    pub rocketx_base_url: String,
    /// Balance provider base URL
    pub moralis_base_url: String,
    /// Price oracle base URL
    pub coingecko_base_url: String,
    /// Partner id sent with quotes and swaps when the client gives none
    pub partner_id: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cache sweep frequency in seconds (default: 30)
    /// - `MAX_CACHE_ENTRIES` - Cache capacity (default: 10000)
    /// - `ALLOWED_ORIGINS` - `*` for a wildcard origin, otherwise the origin is echoed
    /// - `ROCKETX_API_KEY`, `MORALIS_API_KEY`, `COINGECKO_API_KEY` - upstream keys
    /// - `ROCKETX_BASE_URL`, `MORALIS_BASE_URL`, `COINGECKO_BASE_URL` - upstream overrides
    /// - `ROCKETX_PARTNER_ID` - default partner id (default: brofit)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            max_cache_entries: parse_var("MAX_CACHE_ENTRIES")
                .unwrap_or(defaults.max_cache_entries),
            origin_policy: OriginPolicy::from_setting(env::var("ALLOWED_ORIGINS").ok().as_deref()),
            api_keys: ApiKeys::from_env(),
            rocketx_base_url: env::var("ROCKETX_BASE_URL").unwrap_or(defaults.rocketx_base_url),
            moralis_base_url: env::var("MORALIS_BASE_URL").unwrap_or(defaults.moralis_base_url),
            coingecko_base_url: env::var("COINGECKO_BASE_URL")
                .unwrap_or(defaults.coingecko_base_url),
            partner_id: env::var("ROCKETX_PARTNER_ID").unwrap_or(defaults.partner_id),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 30,
            max_cache_entries: 10_000,
            origin_policy: OriginPolicy::Mirror,
            api_keys: ApiKeys::default(),
            rocketx_base_url: ROCKETX_BASE_URL.to_string(),
            moralis_base_url: MORALIS_BASE_URL.to_string(),
            coingecko_base_url: COINGECKO_BASE_URL.to_string(),
            partner_id: "brofit".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Reads a key, trimming whitespace; blank values count as unset.
fn secret_var(name: &str) -> Option<String> {
    normalize_secret(env::var(name).ok())
}

/// Trims a raw key value and drops it when nothing is left.
pub fn normalize_secret(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 30);
        assert_eq!(config.max_cache_entries, 10_000);
        assert_eq!(config.origin_policy, OriginPolicy::Mirror);
        assert!(config.api_keys.rocketx.is_none());
        assert_eq!(config.partner_id, "brofit");
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("MAX_CACHE_ENTRIES");
        env::remove_var("ROCKETX_BASE_URL");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 30);
        assert_eq!(config.max_cache_entries, 10_000);
        assert_eq!(config.rocketx_base_url, ROCKETX_BASE_URL);
    }

    #[test]
    fn test_origin_policy_parsing() {
        assert_eq!(OriginPolicy::from_setting(Some("*")), OriginPolicy::Any);
        assert_eq!(OriginPolicy::from_setting(Some(" * ")), OriginPolicy::Any);
        assert_eq!(
            OriginPolicy::from_setting(Some("https://a.example,https://b.example")),
            OriginPolicy::Mirror
        );
        assert_eq!(OriginPolicy::from_setting(None), OriginPolicy::Mirror);
    }

    #[test]
    fn test_normalize_secret() {
        assert_eq!(
            normalize_secret(Some("  abc\n".to_string())),
            Some("abc".to_string())
        );
        assert_eq!(normalize_secret(Some("   ".to_string())), None);
        assert_eq!(normalize_secret(None), None);
    }

    #[test]
    fn test_env_keys_are_read_on_each_lookup() {
        let keys = ApiKeys::from_env();

        env::set_var(MORALIS_KEY_VAR, "first");
        assert_eq!(keys.moralis().as_deref(), Some("first"));

        env::set_var(MORALIS_KEY_VAR, "  rotated \n");
        assert_eq!(keys.moralis().as_deref(), Some("rotated"));

        env::remove_var(MORALIS_KEY_VAR);
        assert_eq!(keys.moralis(), None);
    }

    #[test]
    fn test_fixed_keys_win_and_skip_env() {
        let keys = ApiKeys {
            coingecko: Some("fixed".to_string()),
            ..ApiKeys::default()
        };
        assert_eq!(keys.coingecko().as_deref(), Some("fixed"));
        assert_eq!(keys.rocketx(), None);
    }

    #[test]
    fn test_api_keys_debug_hides_values() {
        let keys = ApiKeys {
            rocketx: Some("super-secret".to_string()),
            ..ApiKeys::default()
        };
        let printed = format!("{:?}", keys);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("rocketx: true"));
    }
}
