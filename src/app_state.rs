// =============================================================================
// Central Application State — brokernomex API
// =============================================================================
//
// One AppState value is built at startup from the environment `Config` and
// shared across all request handlers via `Arc`. It owns every upstream client
// plus the in-flight OAuth state store; the clients hold their own connection
// pools and need no further synchronization.
//
// Integrations with missing credentials are still constructed — their requests
// fail upstream and degrade to sentinels or clean errors. The one exception is
// OAuth: without an app registration there is nothing to construct, so the
// client is `None` and the linking endpoints report it as unconfigured.
// =============================================================================

use crate::alpaca::{CryptoDataClient, OauthClient, StockDataClient};
use crate::anthropic::AnthropicClient;
use crate::config::Config;
use crate::market_data::MarketData;
use crate::oauth_states::OauthStateStore;
use crate::plaid::PlaidClient;
use crate::supabase::SupabaseClient;

/// Shared service state, built once in `main` and handed to handlers as
/// `Arc<AppState>`.
pub struct AppState {
    pub config: Config,
    pub market_data: MarketData,
    pub supabase: SupabaseClient,
    pub anthropic: AnthropicClient,
    pub plaid: PlaidClient,
    /// Brokerage OAuth client; `None` when no OAuth app is registered.
    pub oauth: Option<OauthClient>,
    pub oauth_states: OauthStateStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let stocks = StockDataClient::new(
            &config.alpaca.api_key,
            &config.alpaca.secret_key,
            &config.alpaca.data_url,
        );
        let crypto = CryptoDataClient::new(
            &config.alpaca.api_key,
            &config.alpaca.secret_key,
            &config.alpaca.data_url,
        );
        let supabase =
            SupabaseClient::new(&config.supabase.url, &config.supabase.service_role_key);
        let anthropic =
            AnthropicClient::new(&config.anthropic.api_key, &config.anthropic.base_url);
        let plaid = PlaidClient::new(
            &config.plaid.client_id,
            &config.plaid.secret,
            &config.plaid.base_url(),
        );
        let oauth = config
            .alpaca
            .has_oauth_app()
            .then(|| OauthClient::new(&config.alpaca));

        Self {
            config,
            market_data: MarketData::new(stocks, crypto),
            supabase,
            anthropic,
            plaid,
            oauth,
            oauth_states: OauthStateStore::new(),
        }
    }
}
