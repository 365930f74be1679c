// =============================================================================
// brokernomex API — library root
// =============================================================================
//
// Backend-for-frontend for the brokernomex trading platform: normalized
// market data over the Alpaca equities and crypto feeds, Supabase-verified
// bearer auth, strategy storage, AI strategy chat, and the Plaid and Alpaca
// account-linking flows. The binary in `main.rs` wires `Config` into
// `AppState` and serves `api::router`; everything else lives here so the
// integration tests can drive the router in-process.
// =============================================================================

pub mod alpaca;
pub mod anthropic;
pub mod api;
pub mod app_state;
pub mod config;
pub mod market_data;
pub mod models;
pub mod oauth_states;
pub mod plaid;
pub mod supabase;
