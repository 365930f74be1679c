// =============================================================================
// Market Data Service — normalized quotes, snapshots, and bars
// =============================================================================
//
// Fans a mixed symbol batch out to the stock and crypto data feeds, then folds
// the responses back into uniform maps:
//
//   1. `symbols`   — classification of raw symbol strings
//   2. `types`     — normalized wire-independent shapes
//   3. `quotes`    — latest quotes for both asset classes
//   4. `snapshots` — equity snapshot bundles (quote/trade/daily bar)
//   5. `bars`      — historical OHLCV series
//   6. `aggregate` — quote + daily-bar join for live price views
//
// Every public method is total: upstream failures and omitted symbols degrade
// to sentinel values instead of errors, so a partial outage never takes down a
// whole response.
// =============================================================================

pub mod symbols;
pub mod types;

mod aggregate;
mod bars;
mod quotes;
mod snapshots;

pub use types::{AggregatedPrice, Bar, Quote, Snapshot, Timeframe};

use crate::alpaca::{CryptoDataClient, StockDataClient};

/// Facade over both upstream data feeds. Cheap to construct; the
/// underlying HTTP clients hold their own connection pools.
pub struct MarketData {
    stocks: StockDataClient,
    crypto: CryptoDataClient,
}

impl MarketData {
    pub fn new(stocks: StockDataClient, crypto: CryptoDataClient) -> Self {
        Self { stocks, crypto }
    }
}
