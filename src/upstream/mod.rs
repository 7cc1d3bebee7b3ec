//! Upstream Module
//!
//! Outbound HTTP to the third-party APIs, with per-attempt timeouts and
//! jittered retries.

mod client;
mod retry;

pub use client::{UpstreamClient, UpstreamRequest, UpstreamResponse};
pub use retry::{RetryPolicy, DEFAULT_RETRY_ON};
