//! Cache Key Module
//!
//! Deterministic keys built from a route name and its query parameters.

use std::fmt;

// == Cache Key ==
/// Route-scoped cache key.
///
/// Parameters are sorted by name (then value) before joining, so two
/// requests carrying the same parameters in a different order share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds `route?k1=v1&k2=v2` from sorted parameters.
    pub fn new<K, V>(route: &str, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut pairs: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        pairs.sort();

        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();

        if query.is_empty() {
            Self(route.to_string())
        } else {
            Self(format!("{}?{}", route, query))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_without_params() {
        let key = CacheKey::new("rocketx:configs", std::iter::empty::<(&str, &str)>());
        assert_eq!(key.as_str(), "rocketx:configs");
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = CacheKey::new("rocketx:tokens", [("page", "1"), ("chainId", "0x1")]);
        let b = CacheKey::new("rocketx:tokens", [("chainId", "0x1"), ("page", "1")]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "rocketx:tokens?chainId=0x1&page=1");
    }

    #[test]
    fn test_key_escapes_values() {
        let key = CacheKey::new("rocketx:tokens", [("keyword", "a&b=c")]);
        assert_eq!(key.as_str(), "rocketx:tokens?keyword=a%26b%3Dc");
    }

    #[test]
    fn test_routes_do_not_collide() {
        let a = CacheKey::new("coingecko:price", [("ids", "bitcoin")]);
        let b = CacheKey::new("rocketx:status", [("ids", "bitcoin")]);
        assert_ne!(a, b);
    }
}
