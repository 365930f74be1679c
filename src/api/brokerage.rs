// =============================================================================
// Brokerage Linking Endpoints — Alpaca OAuth flow
// =============================================================================
//
// Connects a user's own Alpaca account via the authorization-code flow. The
// authorize endpoint mints a CSRF state and hands the frontend a URL to send
// the browser to; the callback redeems the state, exchanges the code, looks up
// the account, and upserts the link into `brokerage_accounts`. The callback is
// hit by a browser redirect, so every outcome — success or failure — answers
// with a redirect back to the frontend accounts page rather than a JSON error.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::alpaca::types::{f64_or_zero, AlpacaAccount, TokenResponse};
use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::app_state::AppState;

const BROKERAGE_ACCOUNTS_TABLE: &str = "brokerage_accounts";

// -----------------------------------------------------------------------------
// GET /api/alpaca/oauth/authorize
// -----------------------------------------------------------------------------

pub async fn oauth_authorize(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let Some(oauth) = state.oauth.as_ref() else {
        return Err(ApiError::internal(
            "Alpaca OAuth configuration missing. Please check ALPACA_CLIENT_ID and \
             ALPACA_OAUTH_REDIRECT_URI environment variables.",
        ));
    };

    let state_token = state.oauth_states.issue(&user.id);
    let oauth_url = oauth
        .authorize_url(&state_token)
        .map_err(|e| ApiError::internal(format!("Failed to generate OAuth URL: {e:#}")))?;

    info!(user_id = %user.id, "generated brokerage authorize URL");

    Ok(Json(json!({
        "oauth_url": oauth_url,
        "state": state_token,
    })))
}

// -----------------------------------------------------------------------------
// GET /api/alpaca/oauth/callback
// -----------------------------------------------------------------------------

/// Query parameters Alpaca appends when redirecting the browser back to us.
#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackQuery>,
) -> Redirect {
    let frontend = state.config.frontend_url.as_str();

    if let Some(reason) = params.error.as_deref().filter(|e| !e.is_empty()) {
        warn!(reason = %reason, "brokerage authorization rejected upstream");
        return frontend_redirect(
            frontend,
            "error",
            &format!("OAuth authorization failed: {reason}"),
        );
    }

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        warn!("oauth callback arrived without an authorization code");
        return frontend_redirect(frontend, "error", "Connection failed");
    };

    let user_id = match params.state.as_deref().and_then(|s| state.oauth_states.take(s)) {
        Some(id) => id,
        None => {
            warn!("oauth callback carried a missing, used, or expired state token");
            return frontend_redirect(frontend, "error", "Invalid authorization state");
        }
    };

    let Some(oauth) = state.oauth.as_ref() else {
        error!("oauth callback received but no OAuth app is configured");
        return frontend_redirect(frontend, "error", "Connection failed");
    };

    info!(user_id = %user_id, "exchanging authorization code for access token");
    let token = match oauth.exchange_code(code).await {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "authorization code exchange failed");
            return frontend_redirect(frontend, "error", "Token exchange failed");
        }
    };
    if token.access_token.is_empty() {
        error!("token grant succeeded but carried no access token");
        return frontend_redirect(frontend, "error", "No access token received");
    }

    let account = match oauth.fetch_account(&token.access_token).await {
        Ok(account) => account,
        Err(e) => {
            error!(error = %e, "linked account lookup failed");
            return frontend_redirect(frontend, "error", "Failed to fetch account information");
        }
    };

    match store_linked_account(&state, &user_id, &token, &account).await {
        Ok(()) => {
            info!(
                user_id = %user_id,
                account_id = account.id.as_deref().unwrap_or(""),
                "brokerage account connected"
            );
            frontend_redirect(frontend, "success", "Alpaca account connected successfully")
        }
        Err(e) => {
            error!(error = %e, "failed to persist linked account");
            frontend_redirect(frontend, "error", "Connection failed")
        }
    }
}

// -----------------------------------------------------------------------------
// GET /api/alpaca/accounts
// -----------------------------------------------------------------------------

pub async fn connected_accounts(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let user_filter = format!("eq.{}", user.id);
    let accounts = state
        .supabase
        .select(
            BROKERAGE_ACCOUNTS_TABLE,
            &[("user_id", user_filter.as_str()), ("brokerage", "eq.alpaca")],
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to fetch accounts: {e:#}")))?;

    Ok(Json(json!({ "accounts": accounts })))
}

// -----------------------------------------------------------------------------
// DELETE /api/alpaca/accounts/:account_id
// -----------------------------------------------------------------------------

pub async fn disconnect_account(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id_filter = format!("eq.{account_id}");
    let user_filter = format!("eq.{}", user.id);
    state
        .supabase
        .delete(
            BROKERAGE_ACCOUNTS_TABLE,
            &[("id", id_filter.as_str()), ("user_id", user_filter.as_str())],
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to disconnect account: {e:#}")))?;

    info!(user_id = %user.id, account_id = %account_id, "brokerage account disconnected");

    Ok(Json(json!({ "message": "Account disconnected successfully" })))
}

// -----------------------------------------------------------------------------
// POST /api/alpaca/refresh-token
// -----------------------------------------------------------------------------

/// Alpaca's OAuth app does not hand out refresh tokens on every grant, and the
/// platform refreshes expired tokens lazily when a trade needs them, so this
/// endpoint only confirms the account exists.
pub async fn refresh_token(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let account_id = body
        .get("account_id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("account_id is required"))?;

    let id_filter = format!("eq.{account_id}");
    let user_filter = format!("eq.{}", user.id);
    let rows = state
        .supabase
        .select(
            BROKERAGE_ACCOUNTS_TABLE,
            &[("id", id_filter.as_str()), ("user_id", user_filter.as_str())],
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to refresh token: {e:#}")))?;

    if rows.is_empty() {
        return Err(ApiError::not_found("Account not found"));
    }

    Ok(Json(json!({
        "message": "Token refresh not currently supported by Alpaca OAuth",
    })))
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Insert or update the `brokerage_accounts` row for this (user, account)
/// pair. The row keeps the token columns the trading layer reads alongside an
/// `oauth_data` blob snapshotting the grant.
async fn store_linked_account(
    state: &AppState,
    user_id: &str,
    token: &TokenResponse,
    account: &AlpacaAccount,
) -> anyhow::Result<()> {
    let account_number = account.id.clone().unwrap_or_default();
    let row = linked_account_row(user_id, token, account);

    let user_filter = format!("eq.{user_id}");
    let number_filter = format!("eq.{account_number}");
    let key = [
        ("user_id", user_filter.as_str()),
        ("account_number", number_filter.as_str()),
    ];

    let existing = state
        .supabase
        .select(BROKERAGE_ACCOUNTS_TABLE, &key)
        .await
        .context("linked account lookup failed")?;

    if existing.is_empty() {
        info!(user_id = %user_id, "storing new linked brokerage account");
        state
            .supabase
            .insert(BROKERAGE_ACCOUNTS_TABLE, &row)
            .await
            .context("failed to store linked account")?;
    } else {
        info!(user_id = %user_id, "updating existing linked brokerage account");
        state
            .supabase
            .update(BROKERAGE_ACCOUNTS_TABLE, &key, &row)
            .await
            .context("failed to update linked account")?;
    }
    Ok(())
}

fn linked_account_row(user_id: &str, token: &TokenResponse, account: &AlpacaAccount) -> Value {
    let account_number = account.id.clone().unwrap_or_default();
    let account_status = account.status.clone().unwrap_or_default();
    let now = Utc::now().to_rfc3339();
    let expires_at = token
        .expires_in
        .map(|secs| (Utc::now() + Duration::seconds(secs)).to_rfc3339());

    json!({
        "user_id": user_id,
        "brokerage": "alpaca",
        "account_name": format!("Alpaca {} Account", title_case(&account_status)),
        "account_type": "stocks",
        "balance": f64_or_zero(account.portfolio_value.as_deref()),
        "is_connected": true,
        "last_sync": now,
        "access_token": token.access_token,
        "refresh_token": token.refresh_token,
        "expires_at": expires_at,
        "account_number": account_number,
        "oauth_data": {
            "access_token": token.access_token,
            "token_type": token.token_type.as_deref().unwrap_or("bearer"),
            "scope": token.scope.as_deref().unwrap_or(""),
            "alpaca_account_id": account_number,
            "account_status": account_status,
            "buying_power": f64_or_zero(account.buying_power.as_deref()),
            "connected_at": now,
        },
    })
}

/// Bounce the browser back to the frontend accounts page, carrying a status
/// and a human-readable message in the query string.
fn frontend_redirect(frontend_url: &str, status: &str, message: &str) -> Redirect {
    let target = format!("{}/accounts", frontend_url.trim_end_matches('/'));
    match reqwest::Url::parse_with_params(&target, &[("status", status), ("message", message)]) {
        Ok(url) => Redirect::temporary(url.as_str()),
        Err(_) => Redirect::temporary(&target),
    }
}

/// Uppercase the first letter of each word, lowercasing the rest, so upstream
/// statuses like `ACTIVE` read as `Active` in account names.
fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut boundary = true;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(ch);
            boundary = true;
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
