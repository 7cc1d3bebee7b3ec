//! Cache Module
//!
//! Process-local response cache with per-route TTLs and lazy expiry.

mod entry;
mod key;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::CacheKey;
pub use policy::{
    is_terminal_status, CachePolicy, BALANCES_TTL, CONFIGS_TTL, PRICE_TTL, QUOTATION_TTL,
    STATUS_TTL, TERMINAL_STATUS_TTL, TOKENS_TTL,
};
pub use stats::CacheStats;
pub use store::ResponseCache;
