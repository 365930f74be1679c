// =============================================================================
// API Layer — routing and request handlers
// =============================================================================
//
// One handler module per resource group, glued together here. Everything the
// frontend calls lives under `/api/`; the root and `/health` endpoints are
// unauthenticated platform metadata. CORS is credentialed and restricted to
// the configured origin list, since the browser sends the Supabase bearer
// token on every call.
// =============================================================================

pub mod auth;
pub mod bank;
pub mod brokerage;
pub mod chat;
pub mod error;
pub mod market_data;
pub mod strategies;
pub mod trades;

use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::app_state::AppState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        // Platform metadata
        .route("/", get(root))
        .route("/health", get(health))
        // Market data
        .route("/api/market-data/symbol/:symbol", get(market_data::symbol_price))
        .route("/api/market-data/quotes", get(market_data::quotes))
        .route("/api/market-data/bars", get(market_data::bars))
        .route("/api/market-data/snapshot", get(market_data::snapshot))
        .route("/api/market-data/live-prices", get(market_data::live_prices))
        .route("/api/market-data/:symbol/historical", get(market_data::historical))
        // Portfolio and trading
        .route("/api/portfolio", get(trades::portfolio))
        .route("/api/trades", get(trades::trades))
        .route("/api/execute-trade", post(trades::execute_trade))
        // Strategy storage
        .route("/api/strategies", get(strategies::list_strategies))
        .route("/api/strategies", post(strategies::create_strategy))
        .route("/api/strategies/:strategy_id", get(strategies::get_strategy))
        .route("/api/strategies/:strategy_id", put(strategies::update_strategy))
        .route("/api/strategies/:strategy_id", delete(strategies::delete_strategy))
        // Strategy chat
        .route("/api/chat/anthropic", post(chat::chat))
        // Bank linking
        .route("/api/plaid/create-link-token", post(bank::create_link_token))
        .route("/api/plaid/exchange-public-token", post(bank::exchange_public_token))
        // Brokerage linking
        .route("/api/alpaca/oauth/authorize", get(brokerage::oauth_authorize))
        .route("/api/alpaca/oauth/callback", get(brokerage::oauth_callback))
        .route("/api/alpaca/accounts", get(brokerage::connected_accounts))
        .route("/api/alpaca/accounts/:account_id", delete(brokerage::disconnect_account))
        .route("/api/alpaca/refresh-token", post(brokerage::refresh_token))
        // Middleware and state
        .layer(cors)
        .with_state(state)
}

/// CORS for the browser frontend. Credentialed CORS cannot use the wildcard
/// origin, so each configured origin must parse; entries that do not are
/// dropped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

// =============================================================================
// Platform metadata (public)
// =============================================================================

async fn root() -> Json<Value> {
    Json(json!({
        "message": "brokernomex Trading API",
        "version": "1.0.0",
        "status": "running",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// =============================================================================
// Tests
// =============================================================================
