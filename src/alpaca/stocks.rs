// =============================================================================
// Alpaca Stock Data Client — equities quotes, snapshots, and bars
// =============================================================================
//
// Thin REST client over the Alpaca data API v2 stock endpoints. Every request
// pins `feed=iex`; the paid SIP feed is not assumed. Credentials ride as
// default headers so individual calls stay signature-free.
// =============================================================================

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use crate::alpaca::types::{BarsEnvelope, QuotesEnvelope, RawBar, RawQuote, RawSnapshot};
use crate::market_data::types::Timeframe;

/// REST client for the stock half of the Alpaca data API.
#[derive(Clone)]
pub struct StockDataClient {
    base_url: String,
    client: reqwest::Client,
}

impl StockDataClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new `StockDataClient`.
    ///
    /// Empty credentials are accepted; requests then fail upstream with 403
    /// and callers degrade to sentinel data.
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

        debug!(base_url, "StockDataClient initialised");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Data endpoints
    // -------------------------------------------------------------------------

    /// GET /v2/stocks/quotes/latest for a batch of symbols.
    #[instrument(skip(self, symbols), name = "alpaca::stock_quotes", fields(count = symbols.len()))]
    pub async fn latest_quotes(&self, symbols: &[String]) -> Result<HashMap<String, RawQuote>> {
        let url = format!("{}/v2/stocks/quotes/latest", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbols", symbols.join(",").as_str()), ("feed", "iex")])
            .send()
            .await
            .context("GET /v2/stocks/quotes/latest request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("stock quotes endpoint returned {}: {}", status, body);
        }

        let env: QuotesEnvelope = resp
            .json()
            .await
            .context("failed to decode stock quotes response")?;
        let quotes = env.quotes.unwrap_or_default();
        debug!(count = quotes.len(), "stock quotes fetched");
        Ok(quotes)
    }

    /// GET /v2/stocks/snapshots for a batch of symbols. The response is a
    /// bare symbol-to-snapshot map with no envelope.
    #[instrument(skip(self, symbols), name = "alpaca::stock_snapshots", fields(count = symbols.len()))]
    pub async fn snapshots(&self, symbols: &[String]) -> Result<HashMap<String, RawSnapshot>> {
        let url = format!("{}/v2/stocks/snapshots", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbols", symbols.join(",").as_str()), ("feed", "iex")])
            .send()
            .await
            .context("GET /v2/stocks/snapshots request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("stock snapshots endpoint returned {}: {}", status, body);
        }

        let snapshots: HashMap<String, RawSnapshot> = resp
            .json()
            .await
            .context("failed to decode stock snapshots response")?;
        debug!(count = snapshots.len(), "stock snapshots fetched");
        Ok(snapshots)
    }

    /// GET /v2/stocks/bars for a batch of symbols over one timeframe.
    #[instrument(
        skip(self, symbols, start, end),
        name = "alpaca::stock_bars",
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
            ("feed", "iex".to_string()),
        ];
        if let Some(start) = start {
            params.push(("start", start.to_rfc3339()));
        }
        if let Some(end) = end {
            params.push(("end", end.to_rfc3339()));
        }

        let url = format!("{}/v2/stocks/bars", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("GET /v2/stocks/bars request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("stock bars endpoint returned {}: {}", status, body);
        }

        let env: BarsEnvelope = resp
            .json()
            .await
            .context("failed to decode stock bars response")?;
        let bars = env.bars.unwrap_or_default();
        debug!(count = bars.len(), "stock bar series fetched");
        Ok(bars)
    }
}

impl std::fmt::Debug for StockDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockDataClient")
            .field("base_url", &self.base_url)
            .field("credentials", &"<redacted>")
            .finish()
    }
}
