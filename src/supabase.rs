// =============================================================================
// Supabase Client — identity verification and row storage
// =============================================================================
//
// Two concerns share one project and one service-role key:
//
//   * identity: forwarded bearer tokens are verified against /auth/v1/user,
//     yielding the caller's user id and email
//   * storage:  strategies and linked-account rows live behind /rest/v1/,
//     queried with PostgREST filter pairs ("user_id", "eq.<id>")
//
// Rows are passed around as `serde_json::Value`; the database is the schema
// authority and handlers shape what they return.
// =============================================================================

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, instrument};

/// The authenticated caller, as verified by the identity endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// REST client for one Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    base_url: String,
    service_role_key: String,
    client: reqwest::Client,
}

impl SupabaseClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new `SupabaseClient`. An empty URL or key produces a client
    /// that reports unconfigured; callers gate with [`Self::is_configured`].
    pub fn new(base_url: &str, service_role_key: &str) -> Self {
        let mut default_headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(service_role_key) {
            default_headers.insert("apikey", val);
        }
        // PostgREST calls authenticate as the service role; get_user overrides
        // this header with the caller's token.
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {service_role_key}")) {
            default_headers.insert(AUTHORIZATION, val);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
            client,
        }
    }

    /// True when both the project URL and the service-role key are present.
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.service_role_key.is_empty()
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Verify a caller's bearer token and return who they are.
    #[instrument(skip_all, name = "supabase::get_user")]
    pub async fn get_user(&self, token: &str) -> Result<Principal> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .context("GET /auth/v1/user request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("identity endpoint returned {}", status);
        }

        let principal: Principal = resp
            .json()
            .await
            .context("failed to decode identity response")?;
        debug!(user_id = %principal.id, "token verified");
        Ok(principal)
    }

    // -------------------------------------------------------------------------
    // Row storage (PostgREST)
    // -------------------------------------------------------------------------

    /// SELECT rows from `table`. Filters are raw PostgREST query pairs, so
    /// ordering and paging ride the same slice:
    /// `[("user_id", "eq.123"), ("order", "updated_at.desc")]`.
    #[instrument(skip(self, filters), name = "supabase::select", fields(table = table))]
    pub async fn select(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let resp = self
            .client
            .get(&url)
            .query(&[("select", "*")])
            .query(filters)
            .send()
            .await
            .with_context(|| format!("select from {table} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("select from {} returned {}: {}", table, status, body);
        }

        resp.json()
            .await
            .with_context(|| format!("failed to decode rows from {table}"))
    }

    /// INSERT one row into `table`, returning the stored row.
    #[instrument(skip(self, row), name = "supabase::insert", fields(table = table))]
    pub async fn insert(&self, table: &str, row: &serde_json::Value) -> Result<serde_json::Value> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let resp = self
            .client
            .post(&url)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .with_context(|| format!("insert into {table} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("insert into {} returned {}: {}", table, status, body);
        }

        let mut rows: Vec<serde_json::Value> = resp
            .json()
            .await
            .with_context(|| format!("failed to decode inserted row from {table}"))?;
        if rows.is_empty() {
            anyhow::bail!("insert into {} returned no rows", table);
        }
        Ok(rows.swap_remove(0))
    }

    /// UPDATE rows matching `filters`, returning the rows as stored.
    #[instrument(skip(self, filters, patch), name = "supabase::update", fields(table = table))]
    pub async fn update(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        patch: &serde_json::Value,
    ) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let resp = self
            .client
            .patch(&url)
            .query(filters)
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .with_context(|| format!("update of {table} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("update of {} returned {}: {}", table, status, body);
        }

        resp.json()
            .await
            .with_context(|| format!("failed to decode updated rows from {table}"))
    }

    /// DELETE rows matching `filters`, returning what was removed.
    #[instrument(skip(self, filters), name = "supabase::delete", fields(table = table))]
    pub async fn delete(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let resp = self
            .client
            .delete(&url)
            .query(filters)
            .header("Prefer", "return=representation")
            .send()
            .await
            .with_context(|| format!("delete from {table} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("delete from {} returned {}: {}", table, status, body);
        }

        resp.json()
            .await
            .with_context(|| format!("failed to decode deleted rows from {table}"))
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}
