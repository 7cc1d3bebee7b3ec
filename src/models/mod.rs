//! Request and Response models for the proxy API
//!
//! DTOs for query strings, JSON bodies and the JSON envelopes sent back.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    PriceQuery, QuoteRequest, QuotationQuery, StatusQuery, SwapRequest, TokensQuery,
    WalletTokensQuery,
};
pub use responses::{with_cached_flag, ErrorResponse, HealthResponse, UpstreamKeyStatus};
