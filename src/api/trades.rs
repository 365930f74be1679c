// =============================================================================
// Trading Endpoints — portfolio, trade history, order execution
// =============================================================================
//
// All three endpoints resolve a per-user trading client first: a linked OAuth
// brokerage account when one exists, otherwise the service-level API key
// fallback. Unlike the market-data reads there is no sentinel substitution
// here — a failed order placement or account fetch is a real error and is
// reported as one (403 for permission denials, 500 otherwise).
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::alpaca::types::{f64_or_zero, AlpacaOrder, OrderRequest};
use crate::alpaca::{trading_client_for_user, TradingClient};
use crate::api::auth::CurrentUser;
use crate::api::error::{alpaca_api_error, ApiError, ApiResult};
use crate::app_state::AppState;

/// Default order-history page size.
const DEFAULT_TRADE_LIMIT: u32 = 50;
/// Placeholder until real round-trip matching exists.
const AVG_TRADE_DURATION_DAYS: f64 = 1.0;

/// Resolve the caller's trading client, surfacing the resolution error text
/// (e.g. no linked account and no configured keys) as a 500.
async fn user_trading_client(
    state: &AppState,
    user: &CurrentUser,
) -> Result<TradingClient, ApiError> {
    trading_client_for_user(
        &state.config.alpaca,
        state.oauth.as_ref(),
        &state.supabase,
        &user.id,
    )
    .await
    .map_err(|e| ApiError::internal(format!("{e:#}")))
}

// -----------------------------------------------------------------------------
// GET /api/portfolio
// -----------------------------------------------------------------------------

pub async fn portfolio(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let client = user_trading_client(&state, &user).await?;
    let account = client
        .account()
        .await
        .map_err(|e| alpaca_api_error("Alpaca API error", e))?;
    let positions = client
        .positions()
        .await
        .map_err(|e| alpaca_api_error("Alpaca API error", e))?;

    let total_value = f64_or_zero(account.portfolio_value.as_deref());
    let day_change = f64_or_zero(account.unrealized_pl.as_deref());
    let day_change_percent = if total_value > 0.0 {
        day_change / total_value * 100.0
    } else {
        0.0
    };

    let formatted_positions: Vec<Value> = positions
        .iter()
        .map(|p| {
            json!({
                "symbol": p.symbol,
                "quantity": f64_or_zero(Some(p.qty.as_str())),
                "market_value": f64_or_zero(p.market_value.as_deref()),
                "cost_basis": f64_or_zero(p.cost_basis.as_deref()),
                "unrealized_pl": f64_or_zero(p.unrealized_pl.as_deref()),
                "unrealized_plpc": f64_or_zero(p.unrealized_plpc.as_deref()),
                "side": p.side.clone().unwrap_or_default(),
            })
        })
        .collect();

    Ok(Json(json!({
        "total_value": total_value,
        "day_change": day_change,
        "day_change_percent": day_change_percent,
        "buying_power": f64_or_zero(account.buying_power.as_deref()),
        "cash": f64_or_zero(account.cash.as_deref()),
        "positions": formatted_positions,
        "account_status": account.status.clone().unwrap_or_default(),
    })))
}

// -----------------------------------------------------------------------------
// GET /api/trades
// -----------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TradesQuery {
    limit: Option<u32>,
    start_date: Option<String>,
    end_date: Option<String>,
}

pub async fn trades(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<TradesQuery>,
) -> ApiResult<Json<Value>> {
    let client = user_trading_client(&state, &user).await?;

    let after = query
        .start_date
        .as_deref()
        .map(parse_range_start)
        .transpose()?;
    let until = query.end_date.as_deref().map(parse_range_end).transpose()?;
    let limit = query.limit.unwrap_or(DEFAULT_TRADE_LIMIT);

    let orders = client
        .orders(limit, after, until)
        .await
        .map_err(|e| alpaca_api_error("Failed to fetch trades", e))?;

    let mut trades = Vec::with_capacity(orders.len());
    let mut total_profit_loss = 0.0;
    let mut executed_trades = 0u32;
    let mut winning_trades = 0u32;

    for order in &orders {
        let profit_loss = toy_profit_loss(order);
        if order.status == "filled" {
            executed_trades += 1;
            total_profit_loss += profit_loss;
            if profit_loss > 0.0 {
                winning_trades += 1;
            }
        }

        trades.push(json!({
            "id": order.id,
            "strategy_id": "manual",
            "symbol": order.symbol,
            "type": order.side.to_lowercase(),
            "quantity": f64_or_zero(order.qty.as_deref()),
            "price": f64_or_zero(
                order.filled_avg_price.as_deref().or(order.limit_price.as_deref())
            ),
            "timestamp": order.created_at.unwrap_or_else(Utc::now).to_rfc3339(),
            "profit_loss": profit_loss,
            "status": order_status_label(&order.status),
        }));
    }

    let total_trades = trades.len();
    let win_rate = if executed_trades > 0 {
        f64::from(winning_trades) / f64::from(executed_trades)
    } else {
        0.0
    };

    Ok(Json(json!({
        "trades": trades,
        "stats": {
            "total_trades": total_trades,
            "total_profit_loss": total_profit_loss,
            "win_rate": win_rate,
            "avg_trade_duration": AVG_TRADE_DURATION_DAYS,
        },
    })))
}

// -----------------------------------------------------------------------------
// POST /api/execute-trade
// -----------------------------------------------------------------------------

pub async fn execute_trade(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let symbol = body
        .get("symbol")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let side = body
        .get("side")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let quantity = number_field(&body, "quantity").filter(|q| *q != 0.0);

    let (Some(symbol), Some(side), Some(quantity)) = (symbol, side, quantity) else {
        return Err(ApiError::bad_request(
            "Missing required fields: symbol, side, quantity",
        ));
    };

    let client = user_trading_client(&state, &user).await?;

    let side = if side.eq_ignore_ascii_case("buy") {
        "buy"
    } else {
        "sell"
    };
    let order_type = body
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("market")
        .to_lowercase();
    let limit_price = number_field(&body, "limit_price");

    // Anything that is not an explicit limit order with a price goes to
    // market.
    let request = match (order_type.as_str(), limit_price) {
        ("limit", Some(price)) => OrderRequest {
            symbol: symbol.to_uppercase(),
            qty: quantity.to_string(),
            side: side.to_string(),
            order_type: "limit".to_string(),
            time_in_force: "day".to_string(),
            limit_price: Some(price.to_string()),
        },
        _ => OrderRequest {
            symbol: symbol.to_uppercase(),
            qty: quantity.to_string(),
            side: side.to_string(),
            order_type: "market".to_string(),
            time_in_force: "day".to_string(),
            limit_price: None,
        },
    };

    let order = client
        .submit_order(&request)
        .await
        .map_err(|e| alpaca_api_error("Alpaca API error", e))?;

    info!(order_id = %order.id, symbol = %order.symbol, side = %order.side, "order submitted");

    Ok(Json(json!({
        "order_id": order.id,
        "symbol": order.symbol,
        "side": order.side.to_lowercase(),
        "quantity": f64_or_zero(order.qty.as_deref()),
        "status": order.status,
        "created_at": order.created_at.unwrap_or_else(Utc::now).to_rfc3339(),
    })))
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Collapse the brokerage's order-status vocabulary into the three states the
/// frontend renders.
fn order_status_label(status: &str) -> &'static str {
    match status {
        "filled" => "executed",
        "new" | "partially_filled" | "accepted" => "pending",
        _ => "failed",
    }
}

/// +2% of filled notional on sell fills; everything else books zero. Real
/// P&L needs round-trip matching, which order history alone cannot provide.
fn toy_profit_loss(order: &AlpacaOrder) -> f64 {
    match (&order.filled_qty, &order.filled_avg_price) {
        (Some(qty), Some(price)) if order.side.eq_ignore_ascii_case("sell") => {
            f64_or_zero(Some(qty)) * f64_or_zero(Some(price)) * 0.02
        }
        _ => 0.0,
    }
}

/// Accept a number or a numeric string for body fields like `quantity`.
fn number_field(body: &Value, key: &str) -> Option<f64> {
    match body.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `YYYY-MM-DD` (or a full naive datetime, assumed UTC) marking the start of
/// the order-history range.
fn parse_range_start(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_iso_utc(raw).ok_or_else(|| {
        ApiError::internal(format!("Failed to fetch trades: invalid date '{raw}'"))
    })
}

/// Same parse as the start, then pinned to 23:59:59.999999 of that day.
fn parse_range_end(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_iso_utc(raw)
        .map(end_of_day)
        .ok_or_else(|| ApiError::internal(format!("Failed to fetch trades: invalid date '{raw}'")))
}

fn parse_iso_utc(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}

fn end_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    match dt.date_naive().and_hms_micro_opt(23, 59, 59, 999_999) {
        Some(naive) => naive.and_utc(),
        None => dt,
    }
}
