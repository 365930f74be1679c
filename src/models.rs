// =============================================================================
// Strategy Schemas
// =============================================================================
//
// Request models for the strategy CRUD surface. Rows live in Supabase as
// JSONB-heavy records; these types validate what callers may set and keep
// absent fields absent (skipped during serialization) so partial updates
// never clobber stored columns. Stored rows flow back to callers as-is, the
// database being the schema authority for responses.
// =============================================================================

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Enumerations
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Moderate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Options,
    Crypto,
    Futures,
    Forex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeHorizon {
    Intraday,
    Swing,
    LongTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationLevel {
    FullyAuto,
    SemiAuto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestMode {
    Paper,
    Sim,
    Live,
}

// -----------------------------------------------------------------------------
// Nested JSONB sections
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalAllocation {
    /// "fixed_amount_usd" | "percent_of_portfolio"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_positions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_exposure_usd: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSizing {
    /// "fixed_units" | "percent_equity" | "volatility_target"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// "HH:MM"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// 0 = Sunday through 6 = Saturday.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderExecution {
    /// "market" | "limit" | "limit_if_touched"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type_default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_tolerance_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_partial_fill: Option<bool>,
    /// "atomic" | "legged"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combo_execution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskControls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_daily_loss_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_drawdown_percent: Option<f64>,
    /// Event flags that pause the strategy, e.g. "earnings", "FOMC".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_on_event_flags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_liquidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bid_ask_spread_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iv_rank_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_open_interest: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notifications {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_return: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_drawdown: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_trades: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_trade_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_deviation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_at_risk: Option<f64>,
}

// -----------------------------------------------------------------------------
// Strategy payloads
// -----------------------------------------------------------------------------

/// Creation payload. `name` and `type` are mandatory, everything else picks
/// up defaults or stays unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub strategy_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub skill_level: SkillLevel,
    #[serde(default)]
    pub min_capital: f64,
    #[serde(default)]
    pub is_active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_class: Option<AssetClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_horizon: Option<TimeHorizon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_level: Option<AutomationLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_allocation: Option<CapitalAllocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_sizing: Option<PositionSizing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_window: Option<TradeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_execution: Option<OrderExecution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_controls: Option<RiskControls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_filters: Option<DataFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Notifications>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtest_mode: Option<BacktestMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtest_params: Option<BacktestParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry_id: Option<String>,

    /// Strategy-specific knobs, stored verbatim.
    #[serde(default)]
    pub configuration: serde_json::Map<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
}

/// Partial-update payload: only fields the caller sets reach the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub strategy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<SkillLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_capital: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_class: Option<AssetClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_horizon: Option<TimeHorizon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_level: Option<AutomationLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_allocation: Option<CapitalAllocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_sizing: Option<PositionSizing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_window: Option<TradeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_execution: Option<OrderExecution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_controls: Option<RiskControls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_filters: Option<DataFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Notifications>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtest_mode: Option<BacktestMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtest_params: Option<BacktestParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
}

// =============================================================================
// Tests
// =============================================================================
