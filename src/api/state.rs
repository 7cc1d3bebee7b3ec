//! Shared application state.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::error::UpstreamError;
use crate::upstream::UpstreamClient;

/// Application state shared across all handlers.
///
/// The response cache is the only mutable state shared between requests;
/// it sits behind an `Arc<RwLock<_>>` so concurrent handlers never see a
/// torn map. Last writer wins on a given key.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<RwLock<ResponseCache>>,
    pub upstream: UpstreamClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, cache: ResponseCache, upstream: UpstreamClient) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            upstream,
            config: Arc::new(config),
        }
    }

    /// Creates state with an empty cache sized from the configuration.
    pub fn from_config(config: Config) -> Result<Self, UpstreamError> {
        let cache = ResponseCache::new(config.max_cache_entries);
        let upstream = UpstreamClient::new()?;
        Ok(Self::new(config, cache, upstream))
    }
}
