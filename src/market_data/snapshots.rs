// =============================================================================
// Snapshots — equity quote/trade/daily-bar bundles
// =============================================================================
//
// Snapshots are an equity-only product: crypto symbols in the request are
// dropped from the result rather than faked. Equities the feed omitted (and
// the whole batch on upstream failure) are filled with sentinel snapshots so
// callers always get one entry per equity.
// =============================================================================

use std::collections::HashMap;

use tracing::{instrument, warn};

use crate::alpaca::types::RawSnapshot;

use super::symbols::partition_symbols;
use super::types::{Snapshot, SnapshotBar, SnapshotQuote, SnapshotTrade};
use super::MarketData;

impl MarketData {
    /// Snapshot bundle for each equity in the batch. Crypto symbols
    /// are excluded from the map entirely; a batch with no equities
    /// returns an empty map without touching the feed.
    #[instrument(skip(self, symbols), name = "market_data::snapshots", fields(count = symbols.len()))]
    pub async fn snapshots(&self, symbols: &[String]) -> HashMap<String, Snapshot> {
        let (equities, _pairs) = partition_symbols(symbols);
        if equities.is_empty() {
            return HashMap::new();
        }

        let fetched: HashMap<String, Snapshot> = match self.stocks.snapshots(&equities).await {
            Ok(raw) => raw
                .into_iter()
                .map(|(symbol, snapshot)| (symbol, snapshot_from_raw(snapshot)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "snapshot fetch failed, serving sentinels");
                HashMap::new()
            }
        };

        let mut out = HashMap::with_capacity(equities.len());
        for symbol in &equities {
            let snapshot = fetched
                .get(symbol)
                .cloned()
                .unwrap_or_else(Snapshot::unavailable);
            out.insert(symbol.clone(), snapshot);
        }
        out
    }
}

/// Sections the feed omitted stay `None`; present sections zero-fill
/// their missing fields.
fn snapshot_from_raw(raw: RawSnapshot) -> Snapshot {
    Snapshot {
        latest_quote: raw.latest_quote.map(|q| SnapshotQuote {
            bid_price: q.bid_price.unwrap_or(0.0),
            ask_price: q.ask_price.unwrap_or(0.0),
            timestamp: q.timestamp,
        }),
        latest_trade: raw.latest_trade.map(|t| SnapshotTrade {
            price: t.price.unwrap_or(0.0),
            size: t.size.unwrap_or(0.0),
            timestamp: t.timestamp,
        }),
        daily_bar: raw.daily_bar.map(|b| SnapshotBar {
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
            timestamp: Some(b.timestamp),
        }),
    }
}
