// =============================================================================
// Alpaca Crypto Data Client — spot pair quotes and bars
// =============================================================================
//
// REST client over the v1beta3 US crypto data endpoints. Symbols here are
// always normalized pairs ("BTC/USD"); callers are responsible for mapping
// user spellings before the batch reaches this layer. There is no snapshot
// endpoint for crypto, so the aggregate view is quote-only for pairs.
// =============================================================================

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use crate::alpaca::types::{BarsEnvelope, QuotesEnvelope, RawBar, RawQuote};
use crate::market_data::types::Timeframe;

/// REST client for the crypto half of the Alpaca data API.
#[derive(Clone)]
pub struct CryptoDataClient {
    base_url: String,
    client: reqwest::Client,
}

impl CryptoDataClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new `CryptoDataClient`. Credentials may be empty; crypto data
    /// is public but authenticated requests get higher rate limits.
    pub fn new(api_key: &str, secret_key: &str, base_url: &str) -> Self {
        let mut default_headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(api_key) {
            default_headers.insert("APCA-API-KEY-ID", val);
        }
        if let Ok(val) = HeaderValue::from_str(secret_key) {
            default_headers.insert("APCA-API-SECRET-KEY", val);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        debug!(base_url, "CryptoDataClient initialised");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Data endpoints
    // -------------------------------------------------------------------------

    /// GET /v1beta3/crypto/us/latest/quotes for a batch of pairs.
    #[instrument(skip(self, symbols), name = "alpaca::crypto_quotes", fields(count = symbols.len()))]
    pub async fn latest_quotes(&self, symbols: &[String]) -> Result<HashMap<String, RawQuote>> {
        let url = format!("{}/v1beta3/crypto/us/latest/quotes", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbols", symbols.join(",").as_str())])
            .send()
            .await
            .context("GET /v1beta3/crypto/us/latest/quotes request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("crypto quotes endpoint returned {}: {}", status, body);
        }

        let env: QuotesEnvelope = resp
            .json()
            .await
            .context("failed to decode crypto quotes response")?;
        let quotes = env.quotes.unwrap_or_default();
        debug!(count = quotes.len(), "crypto quotes fetched");
        Ok(quotes)
    }

    /// GET /v1beta3/crypto/us/bars for a batch of pairs over one timeframe.
    #[instrument(
        skip(self, symbols, start, end),
        name = "alpaca::crypto_bars",
        fields(count = symbols.len(), timeframe = %timeframe)
    )]
    pub async fn bars(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<HashMap<String, Vec<RawBar>>> {
        let mut params: Vec<(&str, String)> = vec![
            ("symbols", symbols.join(",")),
            ("timeframe", timeframe.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(start) = start {
            params.push(("start", start.to_rfc3339()));
        }
        if let Some(end) = end {
            params.push(("end", end.to_rfc3339()));
        }

        let url = format!("{}/v1beta3/crypto/us/bars", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("GET /v1beta3/crypto/us/bars request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("crypto bars endpoint returned {}: {}", status, body);
        }

        let env: BarsEnvelope = resp
            .json()
            .await
            .context("failed to decode crypto bars response")?;
        let bars = env.bars.unwrap_or_default();
        debug!(count = bars.len(), "crypto bar series fetched");
        Ok(bars)
    }
}

impl std::fmt::Debug for CryptoDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoDataClient")
            .field("base_url", &self.base_url)
            .field("credentials", &"<redacted>")
            .finish()
    }
}
