// =============================================================================
// Alpaca Trading Client — account, positions, and order flow
// =============================================================================
//
// Unlike the data clients, trading credentials vary per request: a user with a
// linked brokerage account trades over their own OAuth token, everyone else
// falls back to the platform's API keys. `trading_client_for_user` performs
// that resolution, refreshing expired tokens in place when the linked row
// carries a refresh token.
// =============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use crate::alpaca::oauth::OauthClient;
use crate::alpaca::types::{AlpacaAccount, AlpacaOrder, AlpacaPosition, OrderRequest};
use crate::config::AlpacaConfig;
use crate::supabase::SupabaseClient;

/// How a trading request authenticates upstream.
#[derive(Clone)]
pub enum Credential {
    Keys { api_key: String, secret_key: String },
    OauthToken(String),
}

/// REST client for the Alpaca trading API.
#[derive(Clone)]
pub struct TradingClient {
    base_url: String,
    credential: Credential,
    client: reqwest::Client,
}

impl TradingClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Client authenticated with platform API keys.
    pub fn with_keys(api_key: &str, secret_key: &str, base_url: &str) -> Self {
        Self::build(
            Credential::Keys {
                api_key: api_key.to_string(),
                secret_key: secret_key.to_string(),
            },
            base_url,
        )
    }

    /// Client authenticated with a user's OAuth access token.
    pub fn with_oauth_token(token: &str, base_url: &str) -> Self {
        Self::build(Credential::OauthToken(token.to_string()), base_url)
    }

    fn build(credential: Credential, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
            client,
        }
    }

    /// Attach the right auth headers for this client's credential.
    fn authed(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credential {
            Credential::Keys {
                api_key,
                secret_key,
            } => rb
                .header("APCA-API-KEY-ID", api_key)
                .header("APCA-API-SECRET-KEY", secret_key),
            Credential::OauthToken(token) => rb.bearer_auth(token),
        }
    }

    // -------------------------------------------------------------------------
    // Trading endpoints
    // -------------------------------------------------------------------------

    /// GET /v2/account.
    #[instrument(skip(self), name = "alpaca::account")]
    pub async fn account(&self) -> Result<AlpacaAccount> {
        let url = format!("{}/v2/account", self.base_url);
        let resp = self
            .authed(self.client.get(&url))
            .send()
            .await
            .context("GET /v2/account request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("trading account endpoint returned {}: {}", status, body);
        }

        resp.json().await.context("failed to decode account response")
    }

    /// GET /v2/positions.
    #[instrument(skip(self), name = "alpaca::positions")]
    pub async fn positions(&self) -> Result<Vec<AlpacaPosition>> {
        let url = format!("{}/v2/positions", self.base_url);
        let resp = self
            .authed(self.client.get(&url))
            .send()
            .await
            .context("GET /v2/positions request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("positions endpoint returned {}: {}", status, body);
        }

        resp.json().await.context("failed to decode positions response")
    }

    /// GET /v2/orders with `status=all`, optionally windowed by submission
    /// time.
    #[instrument(skip(self, after, until), name = "alpaca::orders")]
    pub async fn orders(
        &self,
        limit: u32,
        after: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<AlpacaOrder>> {
        let mut params: Vec<(&str, String)> = vec![
            ("status", "all".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(after) = after {
            params.push(("after", after.to_rfc3339()));
        }
        if let Some(until) = until {
            params.push(("until", until.to_rfc3339()));
        }

        let url = format!("{}/v2/orders", self.base_url);
        let resp = self
            .authed(self.client.get(&url))
            .query(&params)
            .send()
            .await
            .context("GET /v2/orders request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("orders endpoint returned {}: {}", status, body);
        }

        resp.json().await.context("failed to decode orders response")
    }

    /// POST /v2/orders.
    #[instrument(skip(self, order), name = "alpaca::submit_order", fields(symbol = %order.symbol, side = %order.side))]
    pub async fn submit_order(&self, order: &OrderRequest) -> Result<AlpacaOrder> {
        let url = format!("{}/v2/orders", self.base_url);
        let resp = self
            .authed(self.client.post(&url))
            .json(order)
            .send()
            .await
            .context("POST /v2/orders request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("order submission returned {}: {}", status, body);
        }

        let placed: AlpacaOrder = resp
            .json()
            .await
            .context("failed to decode order submission response")?;
        debug!(order_id = %placed.id, status = %placed.status, "order submitted");
        Ok(placed)
    }
}

impl std::fmt::Debug for TradingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingClient")
            .field("base_url", &self.base_url)
            .field("credential", &"<redacted>")
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Per-user credential resolution
// -----------------------------------------------------------------------------

/// Resolve the trading client for `user_id`.
///
/// A connected brokerage row wins over platform keys. An expired token with a
/// refresh token on file is refreshed and persisted before use; a failed
/// refresh falls through to the key fallback rather than erroring the request.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn trading_client_for_user(
    alpaca: &AlpacaConfig,
    oauth: Option<&OauthClient>,
    supabase: &SupabaseClient,
    user_id: &str,
) -> Result<TradingClient> {
    let rows = supabase
        .select(
            "brokerage_accounts",
            &[
                ("user_id", &format!("eq.{user_id}")),
                ("brokerage", "eq.alpaca"),
                ("is_connected", "eq.true"),
            ],
        )
        .await
        .context("failed to look up linked brokerage accounts")?;

    if let Some(row) = rows.first() {
        let mut token: Option<String> = row
            .get("access_token")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let refresh = row.get("refresh_token").and_then(|v| v.as_str());
        let expires_at = row
            .get("expires_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        if let (Some(expiry), Some(refresh)) = (expires_at, refresh) {
            if Utc::now() >= expiry {
                token = refresh_linked_token(oauth, supabase, row, refresh).await;
            }
        }

        if let Some(token) = token {
            debug!("using linked brokerage OAuth token");
            return Ok(TradingClient::with_oauth_token(&token, &alpaca.trading_url));
        }
    }

    if alpaca.has_api_keys() {
        debug!("using platform API keys");
        return Ok(TradingClient::with_keys(
            &alpaca.api_key,
            &alpaca.secret_key,
            &alpaca.trading_url,
        ));
    }

    anyhow::bail!(
        "No Alpaca connection found. Please connect your Alpaca account or configure API credentials."
    )
}

/// Refresh an expired access token and persist the rotated credentials.
/// Returns `None` on any failure so the caller can fall back to keys.
async fn refresh_linked_token(
    oauth: Option<&OauthClient>,
    supabase: &SupabaseClient,
    row: &serde_json::Value,
    refresh_token: &str,
) -> Option<String> {
    let Some(oauth) = oauth else {
        error!("OAuth app credentials missing, cannot refresh expired token");
        return None;
    };

    match oauth.refresh_token(refresh_token).await {
        Ok(tok) => {
            let expires_in = tok.expires_in.unwrap_or(3600);
            let expires_at = Utc::now() + Duration::seconds(expires_in);
            let row_id = row.get("id").and_then(|v| v.as_str()).unwrap_or_default();
            let patch = json!({
                "access_token": tok.access_token.as_str(),
                "refresh_token": tok.refresh_token.as_deref().unwrap_or(refresh_token),
                "expires_at": expires_at.to_rfc3339(),
            });
            if let Err(e) = supabase
                .update("brokerage_accounts", &[("id", &format!("eq.{row_id}"))], &patch)
                .await
            {
                warn!(error = %e, "failed to persist refreshed token");
            }
            Some(tok.access_token)
        }
        Err(e) => {
            error!(error = %e, "token refresh failed");
            None
        }
    }
}
