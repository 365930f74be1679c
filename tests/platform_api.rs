// =============================================================================
// Platform API integration tests
// =============================================================================
//
// Exercises everything outside the market-data surface: bearer auth, the
// trading endpoints over a mocked Alpaca trading API, strategy CRUD over a
// mocked PostgREST, the chat and Plaid handshakes, and the brokerage OAuth
// flow end to end — authorize, callback, and the stored link.
// =============================================================================

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    authed_get, authed_json, build_router, mock_identity, send, test_config, TEST_USER,
};

/// Mount an empty `brokerage_accounts` lookup so trading falls back to the
/// platform API keys.
async fn mock_no_linked_accounts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/brokerage_accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

/// GET without auth, returning the redirect target.
async fn get_redirect(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    (status, location)
}

// -----------------------------------------------------------------------------
// Auth
// -----------------------------------------------------------------------------

#[tokio::test]
async fn missing_bearer_is_rejected() {
    let server = MockServer::start().await;
    let app = build_router(test_config(&server.uri()));

    let req = Request::builder()
        .uri("/api/portfolio")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/portfolio").await;

    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid token");
}

// -----------------------------------------------------------------------------
// Trading
// -----------------------------------------------------------------------------

#[tokio::test]
async fn execute_trade_validates_fields_first() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    // No trading mocks mounted: a 400 proves validation ran before any
    // upstream call.
    let app = build_router(test_config(&server.uri()));

    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/execute-trade",
        &json!({"symbol": "AAPL"}),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "Missing required fields: symbol, side, quantity");
}

#[tokio::test]
async fn execute_trade_submits_market_order() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    mock_no_linked_accounts(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .and(body_partial_json(json!({
            "symbol": "AAPL",
            "qty": "2",
            "side": "buy",
            "type": "market",
            "time_in_force": "day",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ord-1",
            "symbol": "AAPL",
            "side": "buy",
            "status": "accepted",
            "qty": "2",
            "created_at": "2024-05-01T15:30:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/execute-trade",
        &json!({"symbol": "aapl", "side": "BUY", "quantity": 2}),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["order_id"], "ord-1");
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["side"], "buy");
    assert_eq!(body["quantity"].as_f64().unwrap(), 2.0);
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn portfolio_combines_account_and_positions() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    mock_no_linked_accounts(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "acc-1",
            "status": "ACTIVE",
            "portfolio_value": "10000",
            "buying_power": "5000",
            "cash": "2500",
            "unrealized_pl": "150",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "symbol": "AAPL",
            "qty": "10",
            "market_value": "1500",
            "cost_basis": "1450",
            "unrealized_pl": "50",
            "unrealized_plpc": "0.0345",
            "side": "long",
        }])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/portfolio").await;

    assert_eq!(status, 200);
    assert_eq!(body["total_value"].as_f64().unwrap(), 10000.0);
    assert_eq!(body["day_change"].as_f64().unwrap(), 150.0);
    assert_eq!(body["day_change_percent"].as_f64().unwrap(), 1.5);
    assert_eq!(body["account_status"], "ACTIVE");
    let positions = body["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0]["symbol"], "AAPL");
    assert_eq!(positions[0]["quantity"].as_f64().unwrap(), 10.0);
    assert_eq!(positions[0]["side"], "long");
}

#[tokio::test]
async fn trades_derive_stats_from_orders() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    mock_no_linked_accounts(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "o-1",
                "symbol": "AAPL",
                "side": "sell",
                "status": "filled",
                "qty": "10",
                "filled_qty": "10",
                "filled_avg_price": "100",
                "created_at": "2024-05-01T15:30:00Z",
            },
            {
                "id": "o-2",
                "symbol": "MSFT",
                "side": "buy",
                "status": "new",
                "qty": "5",
                "limit_price": "200",
                "created_at": "2024-05-02T15:30:00Z",
            },
        ])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/trades").await;

    assert_eq!(status, 200);
    let trades = body["trades"].as_array().unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0]["status"], "executed");
    assert_eq!(trades[0]["profit_loss"].as_f64().unwrap(), 20.0);
    assert_eq!(trades[1]["status"], "pending");
    assert_eq!(trades[1]["price"].as_f64().unwrap(), 200.0);

    assert_eq!(body["stats"]["total_trades"], 2);
    assert_eq!(body["stats"]["total_profit_loss"].as_f64().unwrap(), 20.0);
    assert_eq!(body["stats"]["win_rate"].as_f64().unwrap(), 1.0);
}

// -----------------------------------------------------------------------------
// Strategies
// -----------------------------------------------------------------------------

#[tokio::test]
async fn create_strategy_persists_for_caller() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/trading_strategies"))
        .and(body_partial_json(json!({
            "user_id": TEST_USER,
            "name": "Momo",
            "type": "momentum",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "s-1",
            "user_id": TEST_USER,
            "name": "Momo",
            "type": "momentum",
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/strategies",
        &json!({"name": "Momo", "type": "momentum"}),
    )
    .await;

    assert_eq!(status, 201);
    assert_eq!(body["id"], "s-1");
    assert_eq!(body["name"], "Momo");
}

#[tokio::test]
async fn list_strategies_scopes_to_user() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/trading_strategies"))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("order", "updated_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "s-1"},
            {"id": "s-2"},
        ])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/strategies").await;

    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_strategy_is_not_found() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/trading_strategies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/strategies/zzz").await;

    assert_eq!(status, 404);
    assert_eq!(body["error"], "Strategy not found");
}

#[tokio::test]
async fn update_strategy_returns_updated_row() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/trading_strategies"))
        .and(query_param("id", "eq.s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "s-1",
            "name": "Renamed",
        }])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_json(
        app,
        Method::PUT,
        "/api/strategies/s-1",
        &json!({"name": "Renamed"}),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["name"], "Renamed");
}

#[tokio::test]
async fn delete_strategy_is_no_content() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/trading_strategies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "s-1"}])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/api/strategies/s-1")
        .header(header::AUTHORIZATION, format!("Bearer {}", common::TEST_TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, 204);
    assert!(body.is_null());
}

// -----------------------------------------------------------------------------
// Chat
// -----------------------------------------------------------------------------

#[tokio::test]
async fn chat_requires_api_key() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/chat/anthropic",
        &json!({"message": "hi"}),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "Anthropic API key missing");
}

#[tokio::test]
async fn chat_requires_message() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;

    let mut config = test_config(&server.uri());
    config.anthropic.api_key = "anthropic-key".to_string();
    let app = build_router(config);

    let (status, body) =
        authed_json(app, Method::POST, "/api/chat/anthropic", &json!({})).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "Message is required");
}

#[tokio::test]
async fn chat_round_trips_completion() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Try momentum."}],
            "model": "claude-3-5-sonnet-20241022",
            "usage": {"input_tokens": 10, "output_tokens": 5},
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.anthropic.api_key = "anthropic-key".to_string();
    let app = build_router(config);

    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/chat/anthropic",
        &json!({
            "message": "What should I trade?",
            "history": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "hi"},
            ],
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "Try momentum.");
    assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
    assert_eq!(body["usage"]["total_tokens"], 15);
}

// -----------------------------------------------------------------------------
// Plaid
// -----------------------------------------------------------------------------

#[tokio::test]
async fn plaid_unconfigured_is_server_error() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/plaid/create-link-token",
        &json!({"user_id": TEST_USER}),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "Plaid configuration missing");
}

#[tokio::test]
async fn plaid_link_token_round_trip() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("POST"))
        .and(path("/link/token/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "link_token": "link-abc",
            "expiration": "2024-05-01T16:00:00Z",
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.plaid.client_id = "plaid-id".to_string();
    config.plaid.secret = "plaid-secret".to_string();
    let app = build_router(config);

    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/plaid/create-link-token",
        &json!({"user_id": TEST_USER}),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["link_token"], "link-abc");
    assert_eq!(body["expiration"], "2024-05-01T16:00:00Z");
}

#[tokio::test]
async fn plaid_exchanges_public_token() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("POST"))
        .and(path("/item/public_token/exchange"))
        .and(body_partial_json(json!({"public_token": "public-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "item_id": "item-1",
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.plaid.client_id = "plaid-id".to_string();
    config.plaid.secret = "plaid-secret".to_string();
    let app = build_router(config);

    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/plaid/exchange-public-token",
        &json!({"public_token": "public-1"}),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["access_token"], "access-1");
    assert_eq!(body["item_id"], "item-1");
    assert_eq!(body["message"], "Successfully linked bank account");
}

// -----------------------------------------------------------------------------
// Brokerage OAuth
// -----------------------------------------------------------------------------

#[tokio::test]
async fn oauth_authorize_issues_state() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/alpaca/oauth/authorize").await;

    assert_eq!(status, 200);
    let url = body["oauth_url"].as_str().unwrap();
    let state = body["state"].as_str().unwrap();
    assert!(url.starts_with(&format!("{}/oauth/authorize?", server.uri())));
    assert!(url.contains("client_id=client-id"));
    assert!(url.contains(&format!("state={state}")));
    assert!(!state.is_empty());
}

#[tokio::test]
async fn oauth_callback_rejects_unknown_state() {
    let server = MockServer::start().await;
    let app = build_router(test_config(&server.uri()));

    let (status, location) =
        get_redirect(app, "/api/alpaca/oauth/callback?code=abc&state=bogus").await;

    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location,
        "http://localhost:5173/accounts?status=error&message=Invalid+authorization+state"
    );
}

#[tokio::test]
async fn oauth_callback_reports_provider_error() {
    let server = MockServer::start().await;
    let app = build_router(test_config(&server.uri()));

    let (status, location) = get_redirect(
        app,
        "/api/alpaca/oauth/callback?error=access_denied&code=x&state=y",
    )
    .await;

    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location,
        "http://localhost:5173/accounts?status=error&message=OAuth+authorization+failed%3A+access_denied"
    );
}

#[tokio::test]
async fn oauth_callback_links_account() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "oauth-tok",
            "token_type": "bearer",
            "scope": "account:write data",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "acc-77",
            "status": "ACTIVE",
            "portfolio_value": "9000",
            "buying_power": "18000",
        })))
        .mount(&server)
        .await;
    mock_no_linked_accounts(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/brokerage_accounts"))
        .and(body_partial_json(json!({
            "user_id": TEST_USER,
            "brokerage": "alpaca",
            "account_number": "acc-77",
            "is_connected": true,
            "access_token": "oauth-tok",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": "row-1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));

    let (status, body) = authed_get(app.clone(), "/api/alpaca/oauth/authorize").await;
    assert_eq!(status, 200);
    let state = body["state"].as_str().unwrap().to_string();

    let (status, location) = get_redirect(
        app,
        &format!("/api/alpaca/oauth/callback?code=abc&state={state}"),
    )
    .await;

    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location,
        "http://localhost:5173/accounts?status=success&message=Alpaca+account+connected+successfully"
    );
}

#[tokio::test]
async fn connected_accounts_lists_rows() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/brokerage_accounts"))
        .and(query_param("brokerage", "eq.alpaca"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "b-1"}])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/alpaca/accounts").await;

    assert_eq!(status, 200);
    assert_eq!(body["accounts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn disconnect_account_confirms() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/brokerage_accounts"))
        .and(query_param("id", "eq.b-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "b-1"}])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/api/alpaca/accounts/b-1")
        .header(header::AUTHORIZATION, format!("Bearer {}", common::TEST_TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "Account disconnected successfully");
}

#[tokio::test]
async fn refresh_token_requires_known_account() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/brokerage_accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));

    let (status, body) =
        authed_json(app.clone(), Method::POST, "/api/alpaca/refresh-token", &json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "account_id is required");

    let (status, body) = authed_json(
        app,
        Method::POST,
        "/api/alpaca/refresh-token",
        &json!({"account_id": "b-9"}),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Account not found");
}
