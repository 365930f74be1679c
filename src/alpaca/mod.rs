// =============================================================================
// Alpaca Integration Module
// =============================================================================
//
// Four clients against the two Alpaca hosts:
//
//   1. StockDataClient  — equities quotes/snapshots/bars (data host, IEX feed)
//   2. CryptoDataClient — spot pair quotes/bars (data host, v1beta3)
//   3. TradingClient    — account/positions/orders (trading host)
//   4. OauthClient      — brokerage account linking (app + live API hosts)
//
// The data clients are constructed once at startup from platform keys; the
// trading client is resolved per request because linked users trade over
// their own OAuth token.
// =============================================================================

pub mod crypto;
pub mod oauth;
pub mod stocks;
pub mod trading;
pub mod types;

pub use crypto::CryptoDataClient;
pub use oauth::OauthClient;
pub use stocks::StockDataClient;
pub use trading::{trading_client_for_user, Credential, TradingClient};
