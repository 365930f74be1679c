// =============================================================================
// Strategy Endpoints — CRUD over user-owned strategy rows
// =============================================================================
//
// Strategies live in the `trading_strategies` table; the database is the
// schema authority and rows travel as raw JSON. Every operation is scoped to
// the authenticated user via a `user_id` filter, so one user can never read
// or mutate another's rows. Create stamps `created_at`/`updated_at`; update
// refreshes `updated_at` on every write.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::app_state::AppState;
use crate::models::{RiskLevel, StrategyCreate, StrategyUpdate};

const STRATEGIES_TABLE: &str = "trading_strategies";
/// Default page size for the list endpoint.
const DEFAULT_PAGE_LIMIT: u32 = 100;

// -----------------------------------------------------------------------------
// POST /api/strategies
// -----------------------------------------------------------------------------

pub async fn create_strategy(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StrategyCreate>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut row = serde_json::to_value(&payload)
        .map_err(|e| ApiError::internal(format!("Failed to create strategy: {e}")))?;

    let now = Utc::now().to_rfc3339();
    if let Some(obj) = row.as_object_mut() {
        obj.insert("user_id".to_string(), json!(user.id));
        obj.insert("created_at".to_string(), json!(now));
        obj.insert("updated_at".to_string(), json!(now));
    }

    let created = state
        .supabase
        .insert(STRATEGIES_TABLE, &row)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create strategy: {e:#}")))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// -----------------------------------------------------------------------------
// GET /api/strategies
// -----------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct StrategiesQuery {
    is_active: Option<bool>,
    strategy_type: Option<String>,
    risk_level: Option<RiskLevel>,
    limit: Option<u32>,
    offset: Option<u32>,
}

pub async fn list_strategies(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<StrategiesQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let mut filters: Vec<(&str, String)> = vec![("user_id", format!("eq.{}", user.id))];
    if let Some(active) = query.is_active {
        filters.push(("is_active", format!("eq.{active}")));
    }
    if let Some(strategy_type) = &query.strategy_type {
        filters.push(("type", format!("eq.{strategy_type}")));
    }
    if let Some(level) = query.risk_level {
        filters.push(("risk_level", format!("eq.{}", wire_value(&level))));
    }
    filters.push(("order", "updated_at.desc".to_string()));
    filters.push(("limit", query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).to_string()));
    filters.push(("offset", query.offset.unwrap_or(0).to_string()));

    let borrowed: Vec<(&str, &str)> = filters.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let rows = state
        .supabase
        .select(STRATEGIES_TABLE, &borrowed)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to fetch strategies: {e:#}")))?;

    Ok(Json(rows))
}

// -----------------------------------------------------------------------------
// GET /api/strategies/:strategy_id
// -----------------------------------------------------------------------------

pub async fn get_strategy(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(strategy_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id_filter = format!("eq.{strategy_id}");
    let user_filter = format!("eq.{}", user.id);

    let mut rows = state
        .supabase
        .select(
            STRATEGIES_TABLE,
            &[("id", id_filter.as_str()), ("user_id", user_filter.as_str())],
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to fetch strategy: {e:#}")))?;

    if rows.is_empty() {
        return Err(ApiError::not_found("Strategy not found"));
    }
    Ok(Json(rows.swap_remove(0)))
}

// -----------------------------------------------------------------------------
// PUT /api/strategies/:strategy_id
// -----------------------------------------------------------------------------

pub async fn update_strategy(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(strategy_id): Path<String>,
    Json(payload): Json<StrategyUpdate>,
) -> ApiResult<Json<Value>> {
    let mut patch = serde_json::to_value(&payload)
        .map_err(|e| ApiError::internal(format!("Failed to update strategy: {e}")))?;
    if let Some(obj) = patch.as_object_mut() {
        obj.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    }

    let id_filter = format!("eq.{strategy_id}");
    let user_filter = format!("eq.{}", user.id);

    let mut rows = state
        .supabase
        .update(
            STRATEGIES_TABLE,
            &[("id", id_filter.as_str()), ("user_id", user_filter.as_str())],
            &patch,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update strategy: {e:#}")))?;

    if rows.is_empty() {
        return Err(ApiError::not_found("Strategy not found or not authorized"));
    }
    Ok(Json(rows.swap_remove(0)))
}

// -----------------------------------------------------------------------------
// DELETE /api/strategies/:strategy_id
// -----------------------------------------------------------------------------

/// Deleting a row that does not exist is still a 204; the outcome the caller
/// asked for holds either way.
pub async fn delete_strategy(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(strategy_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id_filter = format!("eq.{strategy_id}");
    let user_filter = format!("eq.{}", user.id);

    state
        .supabase
        .delete(
            STRATEGIES_TABLE,
            &[("id", id_filter.as_str()), ("user_id", user_filter.as_str())],
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete strategy: {e:#}")))?;

    Ok(StatusCode::NO_CONTENT)
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Wire spelling of a serde enum (e.g. `RiskLevel::Low` -> `"low"`), for use
/// in PostgREST filter values.
fn wire_value<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
