// =============================================================================
// Plaid Client — bank account linking
// =============================================================================
//
// Two calls from the Link flow: minting a link token for the frontend widget
// and exchanging the resulting public token for a durable access token.
// Plaid authenticates per request with client_id and secret in the body, not
// headers.
// =============================================================================

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

/// Display name shown inside the Link widget.
const CLIENT_NAME: &str = "brokernomex Trading Platform";

/// A freshly minted link token.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkToken {
    pub link_token: String,
    #[serde(default)]
    pub expiration: Option<String>,
}

/// The durable credentials behind an exchanged public token.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangedToken {
    pub access_token: String,
    pub item_id: String,
}

/// REST client for the Plaid API.
#[derive(Clone)]
pub struct PlaidClient {
    base_url: String,
    client_id: String,
    secret: String,
    client: reqwest::Client,
}

impl PlaidClient {
    pub fn new(client_id: &str, secret: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            secret: secret.to_string(),
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.secret.is_empty()
    }

    /// POST /link/token/create for `user_id`, requesting the transactions,
    /// auth, and identity products.
    #[instrument(skip_all, name = "plaid::create_link_token")]
    pub async fn create_link_token(&self, user_id: &str) -> Result<LinkToken> {
        let url = format!("{}/link/token/create", self.base_url);
        let payload = json!({
            "client_id": self.client_id,
            "secret": self.secret,
            "client_name": CLIENT_NAME,
            "language": "en",
            "country_codes": ["US"],
            "user": { "client_user_id": user_id },
            "products": ["transactions", "auth", "identity"],
        });

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("POST /link/token/create request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("link token endpoint returned {}: {}", status, body);
        }

        let token: LinkToken = resp
            .json()
            .await
            .context("failed to decode link token response")?;
        debug!("link token created");
        Ok(token)
    }

    /// POST /item/public_token/exchange.
    #[instrument(skip_all, name = "plaid::exchange_public_token")]
    pub async fn exchange_public_token(&self, public_token: &str) -> Result<ExchangedToken> {
        let url = format!("{}/item/public_token/exchange", self.base_url);
        let payload = json!({
            "client_id": self.client_id,
            "secret": self.secret,
            "public_token": public_token,
        });

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("POST /item/public_token/exchange request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("public token exchange returned {}: {}", status, body);
        }

        let exchanged: ExchangedToken = resp
            .json()
            .await
            .context("failed to decode token exchange response")?;
        debug!(item_id = %exchanged.item_id, "public token exchanged");
        Ok(exchanged)
    }
}

impl std::fmt::Debug for PlaidClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaidClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
