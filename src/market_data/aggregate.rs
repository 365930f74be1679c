// =============================================================================
// Aggregate — live price view joining quotes with daily bars
// =============================================================================
//
// One row per symbol for dashboard-style consumers: mid price derived from
// the quote, change figures against the daily open, volume/high/low from the
// snapshot's daily bar. Zero is the "absent" value throughout, so sentinel
// quotes produce all-zero rows instead of NaN or infinities.
// =============================================================================

use std::collections::HashMap;

use tracing::instrument;

use super::types::{AggregatedPrice, Quote, Snapshot};
use super::MarketData;

impl MarketData {
    /// Aggregated live price for every requested symbol. Quotes and
    /// snapshots are fetched concurrently; symbols without a snapshot
    /// (all crypto, plus anything the feed omitted) still get a row
    /// from the quote alone.
    #[instrument(skip(self, symbols), name = "market_data::live_prices", fields(count = symbols.len()))]
    pub async fn live_prices(&self, symbols: &[String]) -> HashMap<String, AggregatedPrice> {
        let (quotes, snapshots) = tokio::join!(self.latest_quotes(symbols), self.snapshots(symbols));

        quotes
            .into_iter()
            .map(|(symbol, quote)| {
                let aggregated = combine(&quote, snapshots.get(&symbol));
                (symbol, aggregated)
            })
            .collect()
    }
}

/// Mid price is the bid/ask midpoint when both sides are present,
/// otherwise whichever side is, otherwise zero. Change figures are
/// only computed when both the mid and the daily open are non-zero;
/// a zero open also zeroes the percentage to keep division safe.
fn combine(quote: &Quote, snapshot: Option<&Snapshot>) -> AggregatedPrice {
    let bid = quote.bid_price;
    let ask = quote.ask_price;
    let price = if bid != 0.0 && ask != 0.0 {
        (bid + ask) / 2.0
    } else if bid != 0.0 {
        bid
    } else {
        ask
    };

    let daily_bar = snapshot.and_then(|s| s.daily_bar.as_ref());
    let open = daily_bar.map(|b| b.open).unwrap_or(0.0);
    let change = if price != 0.0 && open != 0.0 {
        price - open
    } else {
        0.0
    };
    let change_percent = if open != 0.0 {
        change / open * 100.0
    } else {
        0.0
    };

    AggregatedPrice {
        price,
        bid_price: bid,
        ask_price: ask,
        change,
        change_percent,
        volume: daily_bar.map(|b| b.volume).unwrap_or(0.0),
        high: daily_bar.map(|b| b.high).unwrap_or(0.0),
        low: daily_bar.map(|b| b.low).unwrap_or(0.0),
        open,
        timestamp: Some(quote.timestamp),
    }
}
