//! API Module
//!
//! Route handlers, CORS envelope and routing for the proxy.
//!
//! # Endpoints
//! - `GET /api/coingecko/simple/price` - spot prices
//! - `GET /api/moralis/wallets/:address/tokens` - wallet token balances
//! - `GET /api/rocketx/configs` - networks and exchanges
//! - `GET /api/rocketx/quotation` - quotation by network name
//! - `GET|POST /api/rocketx/quote` - quotation by network name (GET) or token address (POST)
//! - `POST /api/rocketx/swap` - swap execution
//! - `GET /api/rocketx/status` - transaction status
//! - `GET /api/rocketx/tokens` - paginated token list
//! - `GET /api/health` - liveness, key presence and cache counters

pub mod coingecko;
pub mod cors;
pub mod health;
pub mod moralis;
pub mod pipeline;
pub mod rocketx;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
