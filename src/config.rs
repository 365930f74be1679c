// =============================================================================
// Service Configuration
// =============================================================================
//
// All configuration comes from the environment (a `.env` file is loaded first
// when present) and is read exactly once at startup into a `Config` value.
// Missing credentials never abort startup: the affected integration degrades
// (market data falls back to sentinel values, platform endpoints report the
// integration as unconfigured) so the rest of the API stays usable.
// =============================================================================

use tracing::warn;

/// Default listen address for the HTTP server.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:6853";
/// Default base URL for the market-data API (equities + crypto feeds).
const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";
/// Default base URL for the brokerage trading API (paper endpoint).
const DEFAULT_TRADING_URL: &str = "https://paper-api.alpaca.markets";
/// Default base URL for the brokerage live API host (OAuth token exchange and
/// account lookup always go here, regardless of paper trading).
const DEFAULT_API_BASE_URL: &str = "https://api.alpaca.markets";
/// Default base URL for the brokerage web app, which hosts the OAuth
/// authorize page.
const DEFAULT_APP_BASE_URL: &str = "https://app.alpaca.markets";
/// Default base URL for the chat-completion API.
const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
/// Default frontend origin, used for OAuth redirects and CORS.
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

// =============================================================================
// Per-integration sections
// =============================================================================

/// Alpaca credentials and endpoints: one key pair serves both market-data
/// feeds and acts as the trading fallback when a user has no linked OAuth
/// account; the OAuth app fields drive brokerage linking.
#[derive(Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub secret_key: String,
    pub data_url: String,
    pub trading_url: String,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    pub oauth_redirect_uri: String,
    pub api_base_url: String,
    pub app_base_url: String,
}

impl AlpacaConfig {
    /// True when the market-data key pair is present.
    pub fn has_api_keys(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty()
    }

    /// True when the OAuth app registration is present.
    pub fn has_oauth_app(&self) -> bool {
        !self.oauth_client_id.is_empty() && !self.oauth_client_secret.is_empty()
    }
}

/// Supabase project: identity verification (`/auth/v1/user`) and row storage
/// (`/rest/v1/...`) share the same base URL and service-role key.
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

impl SupabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.service_role_key.is_empty()
    }
}

/// Plaid bank-linking credentials. `environment` selects the upstream host
/// unless an explicit base URL override is set.
#[derive(Clone)]
pub struct PlaidConfig {
    pub client_id: String,
    pub secret: String,
    pub environment: String,
    pub base_url_override: String,
}

impl PlaidConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.secret.is_empty()
    }

    /// Resolve the API host for the configured Plaid environment.
    /// Unknown values fall back to sandbox.
    pub fn base_url(&self) -> String {
        if !self.base_url_override.is_empty() {
            return self.base_url_override.trim_end_matches('/').to_string();
        }
        match self.environment.to_lowercase().as_str() {
            "production" => "https://production.plaid.com",
            "development" => "https://development.plaid.com",
            _ => "https://sandbox.plaid.com",
        }
        .to_string()
    }
}

/// Anthropic chat-completion credentials.
#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
}

impl AnthropicConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// =============================================================================
// Config
// =============================================================================

/// Complete service configuration, assembled once in `main`.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub frontend_url: String,
    pub cors_allowed_origins: Vec<String>,
    pub alpaca: AlpacaConfig,
    pub supabase: SupabaseConfig,
    pub plaid: PlaidConfig,
    pub anthropic: AnthropicConfig,
}

impl Config {
    /// Read the full configuration from the environment.
    ///
    /// Every credential is optional; a warning is logged per missing
    /// integration so operators can see at startup what will be degraded.
    pub fn from_env() -> Self {
        let frontend_url = env_or("FRONTEND_URL", DEFAULT_FRONTEND_URL);
        let default_redirect = "http://localhost:6853/api/alpaca/oauth/callback";

        let config = Self {
            bind_addr: env_or("BROKERNOMEX_BIND_ADDR", DEFAULT_BIND_ADDR),
            cors_allowed_origins: cors_origins(&frontend_url),
            frontend_url,
            alpaca: AlpacaConfig {
                api_key: env_or_empty("ALPACA_API_KEY"),
                secret_key: env_or_empty("ALPACA_SECRET_KEY"),
                data_url: env_or("ALPACA_DATA_URL", DEFAULT_DATA_URL),
                trading_url: env_or("ALPACA_TRADING_URL", DEFAULT_TRADING_URL),
                oauth_client_id: env_or_empty("ALPACA_CLIENT_ID"),
                oauth_client_secret: env_or_empty("ALPACA_CLIENT_SECRET"),
                oauth_redirect_uri: env_or("ALPACA_OAUTH_REDIRECT_URI", default_redirect),
                api_base_url: env_or("ALPACA_API_BASE_URL", DEFAULT_API_BASE_URL),
                app_base_url: env_or("ALPACA_APP_BASE_URL", DEFAULT_APP_BASE_URL),
            },
            supabase: SupabaseConfig {
                url: env_or_empty("SUPABASE_URL").trim_end_matches('/').to_string(),
                service_role_key: env_or_empty("SUPABASE_SERVICE_ROLE_KEY"),
            },
            plaid: PlaidConfig {
                client_id: env_or_empty("PLAID_CLIENT_ID"),
                secret: env_or_empty("PLAID_SECRET"),
                environment: env_or("PLAID_ENV", "sandbox"),
                base_url_override: env_or_empty("PLAID_BASE_URL"),
            },
            anthropic: AnthropicConfig {
                api_key: env_or_empty("ANTHROPIC_API_KEY"),
                base_url: env_or("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_URL),
            },
        };

        if !config.alpaca.has_api_keys() {
            warn!("ALPACA_API_KEY/ALPACA_SECRET_KEY not set — market data will serve sentinel values");
        }
        if !config.supabase.is_configured() {
            warn!("SUPABASE_URL/SUPABASE_SERVICE_ROLE_KEY not set — authenticated endpoints will be rejected");
        }
        if !config.plaid.is_configured() {
            warn!("PLAID_CLIENT_ID/PLAID_SECRET not set — bank linking disabled");
        }
        if !config.anthropic.is_configured() {
            warn!("ANTHROPIC_API_KEY not set — chat endpoint disabled");
        }

        config
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

/// Read `key` from the environment, falling back to `default` when absent or
/// blank.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Read `key` from the environment, empty string when absent.
fn env_or_empty(key: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Build the CORS origin list: explicit `CORS_ALLOWED_ORIGINS` (comma
/// separated) when set, otherwise the frontend URL plus the local dev pair.
fn cors_origins(frontend_url: &str) -> Vec<String> {
    let explicit = env_or_empty("CORS_ALLOWED_ORIGINS");
    let mut origins: Vec<String> = if explicit.is_empty() {
        vec![
            frontend_url.to_string(),
            "http://localhost:5173".to_string(),
            "http://127.0.0.1:5173".to_string(),
        ]
    } else {
        explicit
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };
    origins.dedup();
    origins.retain(|o| !o.is_empty());
    origins
}

// =============================================================================
// Tests
// =============================================================================
