//! Request DTOs for the proxy API
//!
//! Every field is optional at the serde level so that missing parameters
//! reach the handlers and are reported with the route's own message.

use serde::Deserialize;

use crate::validate::Amount;

/// Returns the names of `fields` whose value is missing or blank.
pub fn missing_fields<'a>(fields: &[(&'a str, Option<&str>)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect()
}

/// Query for GET /api/coingecko/simple/price
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceQuery {
    pub ids: Option<String>,
    pub vs_currencies: Option<String>,
    pub include_24hr_change: Option<String>,
    pub include_market_cap: Option<String>,
    pub include_24hr_vol: Option<String>,
}

/// Query for GET /api/moralis/wallets/:address/tokens
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletTokensQuery {
    pub chain: Option<String>,
}

/// Query for GET /api/rocketx/quote (network-name based quotation)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationQuery {
    pub from_token: Option<String>,
    pub from_network: Option<String>,
    pub to_token: Option<String>,
    pub to_network: Option<String>,
    pub amount: Option<String>,
    pub slippage: Option<String>,
    pub included_exchanges: Option<String>,
}

/// Query for GET /api/rocketx/status
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub request_id: Option<String>,
    pub tx_id: Option<String>,
}

/// Query for GET /api/rocketx/tokens
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensQuery {
    pub chain_id: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub keyword: Option<String>,
}

/// Body for POST /api/rocketx/quotation (address based)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub from_token_address: Option<String>,
    pub to_token_address: Option<String>,
    pub amount: Option<Amount>,
    pub from_token_chain_id: Option<String>,
    pub to_token_chain_id: Option<String>,
    pub slippage: Option<f64>,
    pub referrer: Option<String>,
    pub partner_id: Option<String>,
}

/// Body for POST /api/rocketx/swap
///
/// Tokens are identified by the aggregator's numeric ids, not addresses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub from_token_id: Option<u64>,
    pub to_token_id: Option<u64>,
    pub from_token_amount: Option<Amount>,
    pub user_address: Option<String>,
    pub slippage: Option<f64>,
    pub referrer: Option<String>,
    pub partner_id: Option<String>,
}
