//! Cache Policy Module
//!
//! Per-route TTL selection. TTLs are chosen when a response is stored,
//! never baked into the cache itself.

use std::time::Duration;

use serde_json::Value;

pub const PRICE_TTL: Duration = Duration::from_secs(600);
pub const BALANCES_TTL: Duration = Duration::from_secs(60);
pub const CONFIGS_TTL: Duration = Duration::from_secs(600);
pub const TOKENS_TTL: Duration = Duration::from_secs(300);
pub const QUOTATION_TTL: Duration = Duration::from_secs(10);
pub const STATUS_TTL: Duration = Duration::from_secs(30);
pub const TERMINAL_STATUS_TTL: Duration = Duration::from_secs(3600);

// == Cache Policy ==
/// How long a route's successful response stays cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Same TTL for every payload
    Fixed(Duration),
    /// `terminal` once the payload's top-level `status` is `success` or `failed`,
    /// `nominal` otherwise
    TerminalAware { nominal: Duration, terminal: Duration },
}

impl CachePolicy {
    /// Policy used by the transaction status route.
    pub const fn transaction_status() -> Self {
        CachePolicy::TerminalAware {
            nominal: STATUS_TTL,
            terminal: TERMINAL_STATUS_TTL,
        }
    }

    /// TTL to store `value` with.
    pub fn ttl_for(&self, value: &Value) -> Duration {
        match *self {
            CachePolicy::Fixed(ttl) => ttl,
            CachePolicy::TerminalAware { nominal, terminal } => {
                if is_terminal_status(value) {
                    terminal
                } else {
                    nominal
                }
            }
        }
    }

    /// Nominal TTL, used for `Cache-Control` headers.
    pub fn nominal(&self) -> Duration {
        match *self {
            CachePolicy::Fixed(ttl) => ttl,
            CachePolicy::TerminalAware { nominal, .. } => nominal,
        }
    }
}

/// True when a status payload reports an outcome that can no longer change.
pub fn is_terminal_status(value: &Value) -> bool {
    matches!(
        value.get("status").and_then(Value::as_str),
        Some("success") | Some("failed")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_policy_ignores_payload() {
        let policy = CachePolicy::Fixed(TOKENS_TTL);
        assert_eq!(policy.ttl_for(&json!({"status": "success"})), TOKENS_TTL);
        assert_eq!(policy.ttl_for(&json!([])), TOKENS_TTL);
    }

    #[test]
    fn test_terminal_status_escalates_ttl() {
        let policy = CachePolicy::transaction_status();
        assert_eq!(
            policy.ttl_for(&json!({"status": "success", "subState": "withdraw_success"})),
            Duration::from_secs(3600)
        );
        assert_eq!(
            policy.ttl_for(&json!({"status": "failed"})),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_pending_status_keeps_nominal_ttl() {
        let policy = CachePolicy::transaction_status();
        assert_eq!(
            policy.ttl_for(&json!({"status": "pending", "subState": "approved"})),
            Duration::from_secs(30)
        );
        assert_eq!(policy.ttl_for(&json!({})), Duration::from_secs(30));
        assert_eq!(policy.ttl_for(&json!({"status": 1})), Duration::from_secs(30));
    }

    #[test]
    fn test_nominal() {
        assert_eq!(CachePolicy::transaction_status().nominal(), STATUS_TTL);
        assert_eq!(CachePolicy::Fixed(PRICE_TTL).nominal(), PRICE_TTL);
    }
}
