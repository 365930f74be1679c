// =============================================================================
// Alpaca OAuth Client — brokerage account linking
// =============================================================================
//
// Implements the authorization-code flow for connecting a user's own Alpaca
// account: authorize URL generation, code-for-token exchange, token refresh,
// and the post-exchange account lookup. The authorize page lives on the web
// app host while token and account endpoints live on the live API host, so
// the two bases are carried separately.
// =============================================================================

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::alpaca::types::{AlpacaAccount, TokenResponse};
use crate::config::AlpacaConfig;

/// Scope requested when linking: trade on the account and read market data.
const OAUTH_SCOPE: &str = "account:write data";

/// Client for the brokerage OAuth endpoints.
#[derive(Clone)]
pub struct OauthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    app_base_url: String,
    api_base_url: String,
    client: reqwest::Client,
}

impl OauthClient {
    /// Build from the Alpaca section of the runtime config. Callers should
    /// gate on [`AlpacaConfig::has_oauth_app`] first.
    pub fn new(alpaca: &AlpacaConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            client_id: alpaca.oauth_client_id.clone(),
            client_secret: alpaca.oauth_client_secret.clone(),
            redirect_uri: alpaca.oauth_redirect_uri.clone(),
            app_base_url: alpaca.app_base_url.trim_end_matches('/').to_string(),
            api_base_url: alpaca.api_base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// The URL the frontend sends the user to, with a caller-supplied CSRF
    /// state token baked in.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/oauth/authorize", self.app_base_url),
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", OAUTH_SCOPE),
                ("state", state),
            ],
        )
        .context("failed to build authorize URL")?;
        Ok(url.to_string())
    }

    /// Exchange an authorization code for an access token.
    #[instrument(skip_all, name = "alpaca::oauth_exchange")]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        self.token_request(&form).await
    }

    /// Trade a refresh token for a fresh access token.
    #[instrument(skip_all, name = "alpaca::oauth_refresh")]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.token_request(&form).await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let url = format!("{}/oauth/token", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .context("POST /oauth/token request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("token endpoint returned {}: {}", status, body);
        }

        let token: TokenResponse = resp
            .json()
            .await
            .context("failed to decode token response")?;
        debug!(scope = token.scope.as_deref().unwrap_or(""), "token grant succeeded");
        Ok(token)
    }

    /// Fetch the account behind a freshly issued access token, used to name
    /// and key the stored brokerage link.
    #[instrument(skip_all, name = "alpaca::oauth_account")]
    pub async fn fetch_account(&self, access_token: &str) -> Result<AlpacaAccount> {
        let url = format!("{}/v2/account", self.api_base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .context("GET /v2/account request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("account lookup returned {}: {}", status, body);
        }

        resp.json().await.context("failed to decode account response")
    }
}

impl std::fmt::Debug for OauthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
