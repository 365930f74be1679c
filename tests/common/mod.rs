// =============================================================================
// Shared integration-test harness
// =============================================================================
//
// Every suite builds the real router over a config whose upstream base URLs
// all point at one wiremock server: Supabase identity and PostgREST, both
// Alpaca data feeds, the trading API, and the OAuth token host share distinct
// paths, so a single server can play all of them per test.
// =============================================================================

// Each suite compiles its own copy of this module and uses a subset of it.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brokernomex_api::api;
use brokernomex_api::app_state::AppState;
use brokernomex_api::config::{
    AlpacaConfig, AnthropicConfig, Config, PlaidConfig, SupabaseConfig,
};

pub const TEST_TOKEN: &str = "valid-jwt";
pub const TEST_USER: &str = "user-1";

/// Config with every upstream pointed at `base`. Alpaca API keys and the
/// OAuth app registration are present; Plaid and Anthropic start unconfigured
/// so tests can exercise both the degraded and the live paths.
pub fn test_config(base: &str) -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        alpaca: AlpacaConfig {
            api_key: "test-key".to_string(),
            secret_key: "test-secret".to_string(),
            data_url: base.to_string(),
            trading_url: base.to_string(),
            oauth_client_id: "client-id".to_string(),
            oauth_client_secret: "client-secret".to_string(),
            oauth_redirect_uri: "http://localhost:6853/api/alpaca/oauth/callback".to_string(),
            api_base_url: base.to_string(),
            app_base_url: base.to_string(),
        },
        supabase: SupabaseConfig {
            url: base.to_string(),
            service_role_key: "service-role".to_string(),
        },
        plaid: PlaidConfig {
            client_id: String::new(),
            secret: String::new(),
            environment: "sandbox".to_string(),
            base_url_override: base.to_string(),
        },
        anthropic: AnthropicConfig {
            api_key: String::new(),
            base_url: base.to_string(),
        },
    }
}

pub fn build_router(config: Config) -> Router {
    api::router(Arc::new(AppState::new(config)))
}

/// Mount the Supabase identity endpoint accepting any bearer token.
pub async fn mock_identity(server: &MockServer, user_id: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id,
            "email": "trader@example.com",
        })))
        .mount(server)
        .await;
}

/// GET `uri` with the standard test bearer token.
pub async fn authed_get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

/// Send a JSON body with the standard test bearer token.
pub async fn authed_json(
    app: Router,
    http_method: Method,
    uri: &str,
    body: &Value,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(http_method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

/// Drive one request through the router and decode the JSON response. A 204
/// or other empty body decodes as `Value::Null`.
pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
