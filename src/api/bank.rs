// =============================================================================
// Bank Linking Endpoints — Plaid Link handshake
// =============================================================================
//
// Two-step Link flow: the frontend asks for a link token, runs the Plaid
// widget, and posts the resulting public token back for exchange. The
// exchanged access token is returned to the caller; nothing is persisted
// server-side yet.
// =============================================================================

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::app_state::AppState;

// -----------------------------------------------------------------------------
// POST /api/plaid/create-link-token
// -----------------------------------------------------------------------------

pub async fn create_link_token(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    if !state.config.plaid.is_configured() {
        return Err(ApiError::internal("Plaid configuration missing"));
    }

    let user_id = body
        .get("user_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("user_id is required"))?;

    let link = state
        .plaid
        .create_link_token(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create link token: {e:#}")))?;

    Ok(Json(json!({
        "link_token": link.link_token,
        "expiration": link.expiration,
    })))
}

// -----------------------------------------------------------------------------
// POST /api/plaid/exchange-public-token
// -----------------------------------------------------------------------------

pub async fn exchange_public_token(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    if !state.config.plaid.is_configured() {
        return Err(ApiError::internal("Plaid configuration missing"));
    }

    let public_token = body
        .get("public_token")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("public_token is required"))?;

    let exchanged = state
        .plaid
        .exchange_public_token(public_token)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to exchange public token: {e:#}")))?;

    info!(user_id = %user.id, item_id = %exchanged.item_id, "bank account linked");

    Ok(Json(json!({
        "access_token": exchanged.access_token,
        "item_id": exchanged.item_id,
        "message": "Successfully linked bank account",
    })))
}
