// =============================================================================
// Market Data Endpoints — quotes, bars, snapshots, live prices
// =============================================================================
//
// Thin handlers over the market-data service: parse the symbol list and the
// optional time parameters, call the service, return its map as the JSON body
// with no envelope. Upstream trouble never surfaces here — the service
// degrades to sentinel values — so the only client-visible errors are a
// missing symbol list (400) and auth rejections.
//
// `live-prices` is deliberately public: dashboards poll it before the user
// signs in.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::app_state::AppState;
use crate::market_data::{AggregatedPrice, Bar, Quote, Snapshot, Timeframe};

/// Default bar cap when the caller does not pass `limit`.
const DEFAULT_BAR_LIMIT: u32 = 100;

// -----------------------------------------------------------------------------
// Query types
// -----------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SymbolsQuery {
    symbols: Option<String>,
}

#[derive(Deserialize)]
pub struct BarsQuery {
    symbols: Option<String>,
    timeframe: Option<String>,
    start: Option<String>,
    end: Option<String>,
    limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct HistoricalQuery {
    timeframe: Option<String>,
    start: Option<String>,
    end: Option<String>,
    limit: Option<u32>,
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// GET /api/market-data/symbol/:symbol — aggregated price for one symbol.
pub async fn symbol_price(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Json<AggregatedPrice> {
    let symbols = vec![symbol.to_uppercase()];
    let mut prices = state.market_data.live_prices(&symbols).await;
    Json(prices.remove(&symbols[0]).unwrap_or_default())
}

/// GET /api/market-data/quotes?symbols=A,B — latest quotes, keyed by symbol.
pub async fn quotes(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolsQuery>,
) -> ApiResult<Json<HashMap<String, Quote>>> {
    let symbols = parse_symbols(query.symbols.as_deref())?;
    Ok(Json(state.market_data.latest_quotes(&symbols).await))
}

/// GET /api/market-data/bars?symbols=&timeframe=&start=&end=&limit= — OHLCV
/// series per symbol.
pub async fn bars(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<BarsQuery>,
) -> ApiResult<Json<HashMap<String, Vec<Bar>>>> {
    let symbols = parse_symbols(query.symbols.as_deref())?;
    let timeframe = Timeframe::parse_lenient(query.timeframe.as_deref().unwrap_or("1Day"));
    let start = parse_datetime_lenient(query.start.as_deref());
    let end = parse_datetime_lenient(query.end.as_deref());
    let limit = query.limit.unwrap_or(DEFAULT_BAR_LIMIT);

    Ok(Json(
        state
            .market_data
            .bars(&symbols, timeframe, start, end, limit)
            .await,
    ))
}

/// GET /api/market-data/snapshot?symbols= — daily snapshots, equities only.
pub async fn snapshot(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolsQuery>,
) -> ApiResult<Json<HashMap<String, Snapshot>>> {
    let symbols = parse_symbols(query.symbols.as_deref())?;
    Ok(Json(state.market_data.snapshots(&symbols).await))
}

/// GET /api/market-data/live-prices?symbols= — aggregated prices, no auth.
pub async fn live_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolsQuery>,
) -> ApiResult<Json<HashMap<String, AggregatedPrice>>> {
    let symbols = parse_symbols(query.symbols.as_deref())?;
    Ok(Json(state.market_data.live_prices(&symbols).await))
}

/// GET /api/market-data/:symbol/historical — bare bar array for one symbol.
pub async fn historical(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoricalQuery>,
) -> Json<Vec<Bar>> {
    let symbols = vec![symbol.to_uppercase()];
    let timeframe = Timeframe::parse_lenient(query.timeframe.as_deref().unwrap_or("1Day"));
    let start = parse_datetime_lenient(query.start.as_deref());
    let end = parse_datetime_lenient(query.end.as_deref());
    let limit = query.limit.unwrap_or(DEFAULT_BAR_LIMIT);

    let mut bars = state
        .market_data
        .bars(&symbols, timeframe, start, end, limit)
        .await;
    Json(
        bars.remove(&symbols[0])
            .unwrap_or_else(|| vec![Bar::unavailable()]),
    )
}

// -----------------------------------------------------------------------------
// Parsing helpers
// -----------------------------------------------------------------------------

/// Split a comma-separated symbol list, trimming whitespace and uppercasing.
/// An absent parameter and a list that is empty after trimming are both 400s.
fn parse_symbols(raw: Option<&str>) -> ApiResult<Vec<String>> {
    let symbols: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(ApiError::bad_request("symbols query parameter is required"));
    }
    Ok(symbols)
}

/// Lenient timestamp parsing: RFC3339 first, then a naive datetime assumed
/// UTC, then a bare date at UTC midnight. Anything else is treated as unset.
fn parse_datetime_lenient(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    None
}
