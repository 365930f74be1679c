// =============================================================================
// Market Data Records
// =============================================================================
//
// The wire shapes the market-data endpoints serve, plus the sentinel
// constructors used on upstream failure. A sentinel is structurally identical
// to real data (same fields, zero values, `source = "unavailable"`) so a
// dashboard keeps rendering through an outage instead of breaking on a 5xx.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Source tag for equities data (IEX feed).
pub const SOURCE_IEX: &str = "alpaca:iex";
/// Source tag for crypto data.
pub const SOURCE_CRYPTO: &str = "alpaca:crypto";
/// Source tag substituted when an upstream feed is unreachable or forbidden.
pub const SOURCE_UNAVAILABLE: &str = "unavailable";

// =============================================================================
// Timeframe
// =============================================================================

/// Bar interval accepted by the bars endpoints.
///
/// Parsing is deliberately lenient: anything outside the enumerated set
/// coerces to `Day` rather than erroring, so a charting client with a stale
/// interval picker still gets data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    Min1,
    Min5,
    Min15,
    Hour1,
    #[default]
    Day1,
}

impl Timeframe {
    /// The upstream query-string spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Min1 => "1Min",
            Timeframe::Min5 => "5Min",
            Timeframe::Min15 => "15Min",
            Timeframe::Hour1 => "1Hour",
            Timeframe::Day1 => "1Day",
        }
    }

    /// Parse a caller-supplied timeframe, coercing unknown values to `Day`.
    pub fn parse_lenient(value: &str) -> Self {
        match value {
            "1Min" => Timeframe::Min1,
            "5Min" => Timeframe::Min5,
            "15Min" => Timeframe::Min15,
            "1Hour" => Timeframe::Hour1,
            "1Day" => Timeframe::Day1,
            _ => Timeframe::Day1,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Latest bid/ask for one symbol. Sizes are `f64` across both asset classes
/// (crypto sizes are fractional).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub timestamp: DateTime<Utc>,
    pub source: &'static str,
}

impl Quote {
    /// Sentinel quote substituted when the upstream feed failed or omitted
    /// the symbol.
    pub fn unavailable() -> Self {
        Self {
            bid_price: 0.0,
            ask_price: 0.0,
            bid_size: 0.0,
            ask_size: 0.0,
            timestamp: Utc::now(),
            source: SOURCE_UNAVAILABLE,
        }
    }
}

// =============================================================================
// Bar
// =============================================================================

/// One OHLCV sample. Series are ordered ascending as returned upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub source: &'static str,
}

impl Bar {
    /// Sentinel bar; bars responses substitute a one-element series of these
    /// so charting clients never see an empty series.
    pub fn unavailable() -> Self {
        Self {
            timestamp: Utc::now(),
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            volume: 0.0,
            source: SOURCE_UNAVAILABLE,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Quote half of a snapshot. Unlike [`Quote`] this carries no sizes and its
/// timestamp may be absent upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotQuote {
    pub bid_price: f64,
    pub ask_price: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Latest trade half of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotTrade {
    pub price: f64,
    pub size: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Daily bar half of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Point-in-time bundle for one equity symbol. Any sub-field may be absent
/// when the feed has nothing for it (e.g. pre-listing, halted).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub latest_quote: Option<SnapshotQuote>,
    pub latest_trade: Option<SnapshotTrade>,
    pub daily_bar: Option<SnapshotBar>,
}

impl Snapshot {
    /// Sentinel snapshot: all three sub-records present and zeroed.
    pub fn unavailable() -> Self {
        Self {
            latest_quote: Some(SnapshotQuote {
                bid_price: 0.0,
                ask_price: 0.0,
                timestamp: None,
            }),
            latest_trade: Some(SnapshotTrade {
                price: 0.0,
                size: 0.0,
                timestamp: None,
            }),
            daily_bar: Some(SnapshotBar {
                open: 0.0,
                high: 0.0,
                low: 0.0,
                close: 0.0,
                volume: 0.0,
                timestamp: None,
            }),
        }
    }
}

// =============================================================================
// AggregatedPrice
// =============================================================================

/// The unified per-symbol view served by the live-prices endpoints: quote
/// mid-price merged with the daily bar, all derived math nil-safe.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedPrice {
    pub price: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

// =============================================================================
// Tests
// =============================================================================
