//! Input Validation
//!
//! Pure predicates used to reject malformed client input before any
//! upstream call is made. None of them panic.

use serde::Deserialize;

/// Chains the dashboard supports: Ethereum, Polygon, BNB Chain, Arbitrum,
/// Optimism, Avalanche, Fantom, Gnosis, Moonbeam, Moonriver.
pub const SUPPORTED_CHAINS: [u64; 10] = [1, 137, 56, 42161, 10, 43114, 250, 100, 1284, 1285];

/// Native token precision; amounts with more fractional digits are rejected.
pub const MAX_AMOUNT_DECIMALS: usize = 18;

const MAX_CHAIN_ID: i64 = 1_000_000;

/// A token amount as sent by the client, either a JSON string or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(f64),
}

impl Amount {
    /// String form, as the quote endpoint expects it.
    pub fn to_wire(&self) -> String {
        match self {
            Amount::Text(s) => s.clone(),
            Amount::Number(n) => n.to_string(),
        }
    }

    /// JSON form that keeps the client's type: strings stay strings, numbers
    /// stay numbers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Amount::Text(s) => serde_json::Value::String(s.clone()),
            Amount::Number(n) => serde_json::Value::from(*n),
        }
    }
}

fn is_hex_prefixed(s: &str, hex_len: usize) -> bool {
    match s.strip_prefix("0x") {
        Some(hex) => hex.len() == hex_len && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// `0x` followed by 40 hex digits.
pub fn is_valid_address(address: &str) -> bool {
    is_hex_prefixed(address, 40)
}

/// `0x` followed by 64 hex digits.
pub fn is_valid_tx_hash(hash: &str) -> bool {
    is_hex_prefixed(hash, 64)
}

/// Integer strictly between 0 and 1,000,000.
pub fn is_valid_chain_id(chain_id: i64) -> bool {
    chain_id > 0 && chain_id < MAX_CHAIN_ID
}

/// Parses a chain id given as decimal (`137`) or hex (`0x89`).
pub fn parse_chain_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Membership in [`SUPPORTED_CHAINS`]. Separate from [`is_valid_chain_id`]:
/// a well-formed id can still be unsupported.
pub fn is_supported_chain(chain_id: u64) -> bool {
    SUPPORTED_CHAINS.contains(&chain_id)
}

/// Positive, finite, and at most 18 fractional digits when given as text.
pub fn is_valid_amount(amount: &Amount) -> bool {
    match amount {
        Amount::Number(n) => n.is_finite() && *n > 0.0,
        Amount::Text(s) => {
            let s = s.trim();
            let parsed = match s.parse::<f64>() {
                Ok(n) => n,
                Err(_) => return false,
            };
            if !parsed.is_finite() || parsed <= 0.0 {
                return false;
            }
            match s.split_once('.') {
                Some((_, fraction)) => fraction.len() <= MAX_AMOUNT_DECIMALS,
                None => true,
            }
        }
    }
}

/// 1 to 10 ASCII letters or digits.
pub fn is_valid_token_symbol(symbol: &str) -> bool {
    (1..=10).contains(&symbol.len()) && symbol.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Splits `addresses` into a verdict and the offending entries.
pub fn validate_addresses<'a>(addresses: &[&'a str]) -> (bool, Vec<&'a str>) {
    let invalid: Vec<&str> = addresses
        .iter()
        .copied()
        .filter(|a| !is_valid_address(a))
        .collect();
    (invalid.is_empty(), invalid)
}

/// Truncates to `max_len` characters and strips `< > " ' &`.
pub fn sanitize_url_param(param: &str, max_len: usize) -> String {
    param
        .chars()
        .take(max_len)
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect()
}

/// Optional fields checked together by [`validate_query_params`].
#[derive(Debug, Clone, Default)]
pub struct QueryParams<'a> {
    pub address: Option<&'a str>,
    pub chain_id: Option<&'a str>,
    pub amount: Option<Amount>,
    pub token_symbol: Option<&'a str>,
}

/// Returns one message per failed check; empty means valid.
///
/// Chain ids must be well formed and on the supported-chain allowlist.
pub fn validate_query_params(params: &QueryParams<'_>) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(address) = params.address {
        if !is_valid_address(address) {
            errors.push("Invalid Ethereum address format".to_string());
        }
    }

    if let Some(raw) = params.chain_id {
        match parse_chain_id(raw).filter(|id| is_valid_chain_id(*id)) {
            None => errors.push("Invalid chain ID".to_string()),
            Some(id) if !is_supported_chain(id as u64) => {
                errors.push(format!("Chain ID {} is not supported", id))
            }
            Some(_) => {}
        }
    }

    if let Some(amount) = &params.amount {
        if !is_valid_amount(amount) {
            errors.push("Invalid amount format".to_string());
        }
    }

    if let Some(symbol) = params.token_symbol {
        if !is_valid_token_symbol(symbol) {
            errors.push("Invalid token symbol format".to_string());
        }
    }

    errors
}

/// Maps chain names accepted by the wallet route to the balance provider's
/// hex ids. Unknown values are passed through unchanged.
pub fn resolve_moralis_chain(chain: &str) -> String {
    let hex = match chain.to_ascii_lowercase().as_str() {
        "eth" | "ethereum" => "0x1",
        "polygon" | "matic" => "0x89",
        "bsc" | "binance" => "0x38",
        "arbitrum" => "0xa4b1",
        "optimism" => "0xa",
        "avalanche" | "avax" => "0xa86a",
        "fantom" | "ftm" => "0xfa",
        _ => return chain.to_string(),
    };
    hex.to_string()
}
