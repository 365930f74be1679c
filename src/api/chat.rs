// =============================================================================
// Chat Endpoint — AI strategy assistant
// =============================================================================
//
// Single endpoint bridging the frontend chat widget to the Anthropic
// Messages API. The caller sends the new message plus its local history; the
// handler keeps the last ten history turns, appends the new message, and
// sends everything under a fixed trading-assistant system prompt.
// =============================================================================

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::anthropic::{ChatMessage, DEFAULT_MODEL};
use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::app_state::AppState;

/// Completion budget per reply.
const MAX_TOKENS: u32 = 4000;
const TEMPERATURE: f64 = 0.7;
/// History turns carried into each request, newest last.
const HISTORY_WINDOW: usize = 10;

const SYSTEM_PROMPT: &str = "You are BrokerNomics AI, an expert trading strategy assistant for the brokernomex platform. You help users understand different trading strategies, analyze market conditions, and guide them through creating automated trading bots.

Key areas of expertise:
- Options strategies (covered calls, iron condors, straddles, the wheel)
- Grid trading bots (spot grid, futures grid, infinity grid)
- DCA (Dollar Cost Averaging) strategies
- Smart rebalancing and portfolio management
- Risk management and position sizing
- Market analysis and technical indicators

Always provide practical, actionable advice while emphasizing risk management. When discussing strategies, explain both the potential benefits and risks. Be helpful but remind users to do their own research and consider their risk tolerance.";

// -----------------------------------------------------------------------------
// POST /api/chat/anthropic
// -----------------------------------------------------------------------------

pub async fn chat(
    _user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    if !state.config.anthropic.is_configured() {
        return Err(ApiError::internal("Anthropic API key missing"));
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("Message is required"))?;

    let model = body
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MODEL);

    let mut messages = conversation_window(body.get("history"));
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: message.to_string(),
    });

    let completion = state
        .anthropic
        .complete(model, SYSTEM_PROMPT, &messages, MAX_TOKENS, TEMPERATURE)
        .await
        .map_err(|e| ApiError::internal(format!("Anthropic API error: {e:#}")))?;

    Ok(Json(json!({
        "message": completion.text,
        "model": completion.model,
        "usage": {
            "input_tokens": completion.input_tokens,
            "output_tokens": completion.output_tokens,
            "total_tokens": completion.input_tokens + completion.output_tokens,
        },
    })))
}

/// Last `HISTORY_WINDOW` history entries, keeping only well-formed user and
/// assistant turns.
fn conversation_window(history: Option<&Value>) -> Vec<ChatMessage> {
    let entries = match history.and_then(Value::as_array) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    entries[entries.len().saturating_sub(HISTORY_WINDOW)..]
        .iter()
        .filter_map(|entry| {
            let role = entry.get("role").and_then(Value::as_str)?;
            if role != "user" && role != "assistant" {
                return None;
            }
            let content = entry.get("content").and_then(Value::as_str)?;
            Some(ChatMessage {
                role: role.to_string(),
                content: content.to_string(),
            })
        })
        .collect()
}
