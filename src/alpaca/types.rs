// =============================================================================
// Alpaca Wire Types
// =============================================================================
//
// Deserialization targets for the Alpaca data and trading APIs. The data API
// abbreviates field names ("bp" = bid price) and omits fields it has no value
// for, so everything optional is modeled as Option and renamed here, keeping
// the rest of the crate free of wire quirks. The trading API encodes numerics
// as JSON strings; `f64_or_zero` is the tolerant bridge back to floats.
// =============================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Data API: quotes / trades / bars / snapshots
// -----------------------------------------------------------------------------

/// Latest quote as served by the data API (stocks and crypto share the shape).
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuote {
    #[serde(rename = "t")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "bp")]
    pub bid_price: Option<f64>,
    #[serde(rename = "bs")]
    pub bid_size: Option<f64>,
    #[serde(rename = "ap")]
    pub ask_price: Option<f64>,
    #[serde(rename = "as")]
    pub ask_size: Option<f64>,
}

/// Latest trade within a snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrade {
    #[serde(rename = "t")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "p")]
    pub price: Option<f64>,
    #[serde(rename = "s")]
    pub size: Option<f64>,
}

/// One OHLCV bar. The timestamp and prices are always present upstream;
/// trade count and VWAP are only sent for equities.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "n")]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw")]
    pub vwap: Option<f64>,
}

/// Per-symbol snapshot bundle. Field names switch to camelCase upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSnapshot {
    #[serde(rename = "latestQuote")]
    pub latest_quote: Option<RawQuote>,
    #[serde(rename = "latestTrade")]
    pub latest_trade: Option<RawTrade>,
    #[serde(rename = "minuteBar")]
    pub minute_bar: Option<RawBar>,
    #[serde(rename = "dailyBar")]
    pub daily_bar: Option<RawBar>,
    #[serde(rename = "prevDailyBar")]
    pub prev_daily_bar: Option<RawBar>,
}

/// Envelope around multi-symbol latest-quotes responses. The map can be
/// missing or null when nothing matched.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotesEnvelope {
    #[serde(default)]
    pub quotes: Option<HashMap<String, RawQuote>>,
}

/// Envelope around multi-symbol bars responses.
#[derive(Debug, Clone, Deserialize)]
pub struct BarsEnvelope {
    #[serde(default)]
    pub bars: Option<HashMap<String, Vec<RawBar>>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

// -----------------------------------------------------------------------------
// Trading API: account / positions / orders
// -----------------------------------------------------------------------------

/// Trading account summary. Monetary fields arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaAccount {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub portfolio_value: Option<String>,
    #[serde(default)]
    pub buying_power: Option<String>,
    #[serde(default)]
    pub cash: Option<String>,
    // Not part of the documented account schema but present on some account
    // tiers; treated as zero when absent.
    #[serde(default)]
    pub unrealized_pl: Option<String>,
}

/// One open position.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaPosition {
    pub symbol: String,
    pub qty: String,
    #[serde(default)]
    pub market_value: Option<String>,
    #[serde(default)]
    pub cost_basis: Option<String>,
    #[serde(default)]
    pub unrealized_pl: Option<String>,
    #[serde(default)]
    pub unrealized_plpc: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
}

/// One order, open or historical. `qty` is null for notional orders.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaOrder {
    pub id: String,
    pub symbol: String,
    pub side: String,
    pub status: String,
    #[serde(default)]
    pub qty: Option<String>,
    #[serde(default)]
    pub filled_qty: Option<String>,
    #[serde(default)]
    pub filled_avg_price: Option<String>,
    #[serde(default)]
    pub limit_price: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Order submission payload. Quantities go upstream as strings, matching what
/// the trading API hands back.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<String>,
}

/// OAuth token-exchange response. Refresh fields are optional because the
/// brokerage does not issue refresh tokens on every grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    // Defaulted so a malformed grant decodes and can be rejected explicitly.
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Parse a string-encoded numeric field, treating absent or malformed values
/// as zero.
pub fn f64_or_zero(field: Option<&str>) -> f64 {
    field.and_then(|s| s.parse::<f64>().ok()).unwrap_or(0.0)
}

// =============================================================================
// Tests
// =============================================================================
