// =============================================================================
// Bars — historical OHLCV series for a mixed symbol batch
// =============================================================================
//
// Same fan-out shape as the quote fetch: partition, hit both feeds
// concurrently, re-key by the caller's spelling. The series contract is
// non-empty: a symbol the feeds omitted, an empty upstream series, or a
// whole-class failure all yield a single sentinel bar.
// =============================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use crate::alpaca::types::RawBar;

use super::symbols::{partition_symbols, upstream_key};
use super::types::{Bar, Timeframe, SOURCE_CRYPTO, SOURCE_IEX};
use super::MarketData;

impl MarketData {
    /// OHLCV series for every requested symbol, keyed by uppercased
    /// input spelling. Every entry is a non-empty vec; symbols the
    /// feeds could not serve get a single sentinel bar.
    #[instrument(
        skip(self, symbols, start, end),
        name = "market_data::bars",
        fields(count = symbols.len(), timeframe = %timeframe, limit)
    )]
    pub async fn bars(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: u32,
    ) -> HashMap<String, Vec<Bar>> {
        let (equities, pairs) = partition_symbols(symbols);

        let (stock_bars, crypto_bars) = tokio::join!(
            self.stock_bars_or_empty(&equities, timeframe, start, end, limit),
            self.crypto_bars_or_empty(&pairs, timeframe, start, end, limit),
        );

        let mut fetched = stock_bars;
        fetched.extend(crypto_bars);

        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            let series = fetched
                .get(&upstream_key(symbol))
                .filter(|series| !series.is_empty())
                .cloned()
                .unwrap_or_else(|| vec![Bar::unavailable()]);
            out.insert(symbol.to_uppercase(), series);
        }
        out
    }

    async fn stock_bars_or_empty(
        &self,
        equities: &[String],
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: u32,
    ) -> HashMap<String, Vec<Bar>> {
        if equities.is_empty() {
            return HashMap::new();
        }
        match self.stocks.bars(equities, timeframe, start, end, limit).await {
            Ok(raw) => raw
                .into_iter()
                .map(|(symbol, series)| (symbol, bars_from_raw(series, SOURCE_IEX)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "stock bar fetch failed, serving sentinels");
                HashMap::new()
            }
        }
    }

    async fn crypto_bars_or_empty(
        &self,
        pairs: &[String],
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: u32,
    ) -> HashMap<String, Vec<Bar>> {
        if pairs.is_empty() {
            return HashMap::new();
        }
        match self.crypto.bars(pairs, timeframe, start, end, limit).await {
            Ok(raw) => raw
                .into_iter()
                .map(|(symbol, series)| (symbol, bars_from_raw(series, SOURCE_CRYPTO)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "crypto bar fetch failed, serving sentinels");
                HashMap::new()
            }
        }
    }
}

fn bars_from_raw(raw: Vec<RawBar>, source: &'static str) -> Vec<Bar> {
    raw.into_iter()
        .map(|b| Bar {
            timestamp: b.timestamp,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
            source,
        })
        .collect()
}
