// =============================================================================
// Latest Quotes — mixed-batch quote fetch with sentinel fill
// =============================================================================
//
// Splits the request into an equity batch and a crypto batch, fetches both
// feeds concurrently, then re-keys the results by the caller's (uppercased)
// spelling. Symbols the feeds omitted and whole-class failures come back as
// sentinel quotes tagged `unavailable` rather than holes or errors.
// =============================================================================

use std::collections::HashMap;

use chrono::Utc;
use tracing::{instrument, warn};

use crate::alpaca::types::RawQuote;

use super::symbols::{partition_symbols, upstream_key};
use super::types::{Quote, SOURCE_CRYPTO, SOURCE_IEX};
use super::MarketData;

impl MarketData {
    /// Latest quote for every requested symbol. The returned map has
    /// exactly one entry per input symbol, keyed by its uppercased
    /// spelling, and never fails: anything the feeds could not serve
    /// is a zeroed sentinel quote.
    #[instrument(skip(self, symbols), name = "market_data::latest_quotes", fields(count = symbols.len()))]
    pub async fn latest_quotes(&self, symbols: &[String]) -> HashMap<String, Quote> {
        let (equities, pairs) = partition_symbols(symbols);

        let (stock_quotes, crypto_quotes) = tokio::join!(
            self.stock_quotes_or_empty(&equities),
            self.crypto_quotes_or_empty(&pairs),
        );

        let mut fetched = stock_quotes;
        fetched.extend(crypto_quotes);

        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            let quote = fetched
                .get(&upstream_key(symbol))
                .cloned()
                .unwrap_or_else(Quote::unavailable);
            out.insert(symbol.to_uppercase(), quote);
        }
        out
    }

    async fn stock_quotes_or_empty(&self, equities: &[String]) -> HashMap<String, Quote> {
        if equities.is_empty() {
            return HashMap::new();
        }
        match self.stocks.latest_quotes(equities).await {
            Ok(raw) => raw
                .into_iter()
                .map(|(symbol, quote)| (symbol, quote_from_raw(quote, SOURCE_IEX)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "stock quote fetch failed, serving sentinels");
                HashMap::new()
            }
        }
    }

    async fn crypto_quotes_or_empty(&self, pairs: &[String]) -> HashMap<String, Quote> {
        if pairs.is_empty() {
            return HashMap::new();
        }
        match self.crypto.latest_quotes(pairs).await {
            Ok(raw) => raw
                .into_iter()
                .map(|(symbol, quote)| (symbol, quote_from_raw(quote, SOURCE_CRYPTO)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "crypto quote fetch failed, serving sentinels");
                HashMap::new()
            }
        }
    }
}

/// Missing fields collapse to zero so downstream math never sees a
/// null; a missing timestamp is stamped with the fetch time.
fn quote_from_raw(raw: RawQuote, source: &'static str) -> Quote {
    Quote {
        bid_price: raw.bid_price.unwrap_or(0.0),
        ask_price: raw.ask_price.unwrap_or(0.0),
        bid_size: raw.bid_size.unwrap_or(0.0),
        ask_size: raw.ask_size.unwrap_or(0.0),
        timestamp: raw.timestamp.unwrap_or_else(Utc::now),
        source,
    }
}
