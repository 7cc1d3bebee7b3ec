//! DeFi Edge Proxy - credential-hiding caching proxy for swap widgets
//!
//! Fronts a swap/bridge aggregator, a wallet balance provider and a price
//! oracle. Server-held API keys never reach the browser; responses are
//! cached per route with TTL expiry.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;
pub mod upstream;
pub mod validate;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{ProxyError, UpstreamError};
pub use tasks::spawn_cleanup_task;
