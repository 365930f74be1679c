// =============================================================================
// Market data API integration tests
// =============================================================================
//
// Drives the real router against wiremock stand-ins for the Alpaca data
// feeds and Supabase identity. The interesting properties: responses are
// keyed by exactly the requested symbols, upstream failures degrade to
// sentinel records instead of errors, and the lenient query parsing
// (timeframes, symbol case) normalizes before anything hits the wire.
// =============================================================================

mod common;

use axum::body::Body;
use axum::http::Request;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{authed_get, build_router, mock_identity, send, test_config, TEST_USER};

async fn mock_stock_quotes(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v2/stocks/quotes/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_stock_snapshots(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v2/stocks/snapshots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn symbol_price_merges_quote_and_daily_bar() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    mock_stock_quotes(
        &server,
        json!({"quotes": {"AAPL": {
            "bp": 10.0, "ap": 12.0, "bs": 5.0, "as": 7.0,
            "t": "2024-05-01T15:30:00Z",
        }}}),
    )
    .await;
    mock_stock_snapshots(
        &server,
        json!({"AAPL": {
            "latestTrade": {"p": 11.5, "s": 3.0},
            "dailyBar": {
                "t": "2024-05-01T04:00:00Z",
                "o": 8.0, "h": 13.0, "l": 7.0, "c": 11.0, "v": 1000.0,
            },
        }}),
    )
    .await;

    let app = build_router(test_config(&server.uri()));
    // Lowercase on purpose; the API normalizes symbol case.
    let (status, body) = authed_get(app, "/api/market-data/symbol/aapl").await;

    assert_eq!(status, 200);
    assert_eq!(body["price"].as_f64().unwrap(), 11.0);
    assert_eq!(body["bid_price"].as_f64().unwrap(), 10.0);
    assert_eq!(body["ask_price"].as_f64().unwrap(), 12.0);
    assert_eq!(body["change"].as_f64().unwrap(), 3.0);
    assert_eq!(body["change_percent"].as_f64().unwrap(), 37.5);
    assert_eq!(body["volume"].as_f64().unwrap(), 1000.0);
    assert_eq!(body["high"].as_f64().unwrap(), 13.0);
    assert_eq!(body["low"].as_f64().unwrap(), 7.0);
    assert_eq!(body["open"].as_f64().unwrap(), 8.0);
}

#[tokio::test]
async fn quotes_are_keyed_by_requested_symbols() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    mock_stock_quotes(
        &server,
        json!({"quotes": {"AAPL": {"bp": 1.0, "ap": 2.0}}}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1beta3/crypto/us/latest/quotes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"quotes": {"BTC/USD": {"bp": 60000.0, "ap": 60010.0}}}),
        ))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/market-data/quotes?symbols=aapl,BTC/usd").await;

    assert_eq!(status, 200);
    let keys = body.as_object().unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(body["AAPL"]["bid_price"].as_f64().unwrap(), 1.0);
    assert_eq!(body["AAPL"]["source"], "alpaca:iex");
    assert_eq!(body["BTC/USD"]["ask_price"].as_f64().unwrap(), 60010.0);
    assert_eq!(body["BTC/USD"]["source"], "alpaca:crypto");
}

#[tokio::test]
async fn ambiguous_short_symbols_ride_the_equity_batch() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    // BTC is three alphabetic characters, so it batches with the equities;
    // the feed only knows AAPL and the API fills the gap with a sentinel.
    Mock::given(method("GET"))
        .and(path("/v2/stocks/quotes/latest"))
        .and(query_param("symbols", "AAPL,BTC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"quotes": {"AAPL": {"bp": 1.0, "ap": 2.0, "bs": 3.0, "as": 4.0}}}),
        ))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/market-data/quotes?symbols=AAPL,BTC").await;

    assert_eq!(status, 200);
    assert_eq!(body.as_object().unwrap().len(), 2);
    for key in ["AAPL", "BTC"] {
        for field in [
            "bid_price",
            "ask_price",
            "bid_size",
            "ask_size",
            "timestamp",
            "source",
        ] {
            assert!(body[key].get(field).is_some(), "{key} is missing {field}");
        }
    }
    assert_eq!(body["AAPL"]["source"], "alpaca:iex");
    assert_eq!(body["BTC"]["source"], "unavailable");
}

#[tokio::test]
async fn quotes_without_symbols_is_bad_request() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/market-data/quotes").await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "symbols query parameter is required");
}

#[tokio::test]
async fn denied_feed_degrades_to_sentinel_prices() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/quotes/latest"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/snapshots"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/market-data/symbol/AAPL").await;

    assert_eq!(status, 200);
    assert_eq!(body["price"].as_f64().unwrap(), 0.0);
    assert_eq!(body["bid_price"].as_f64().unwrap(), 0.0);
    assert_eq!(body["change"].as_f64().unwrap(), 0.0);
    assert_eq!(body["volume"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn bars_pad_missing_series_with_sentinels() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bars": {
            "AAPL": [
                {"t": "2024-05-01T04:00:00Z", "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10.0},
                {"t": "2024-05-02T04:00:00Z", "o": 1.5, "h": 3.0, "l": 1.0, "c": 2.5, "v": 20.0},
            ],
        }})))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) =
        authed_get(app, "/api/market-data/bars?symbols=AAPL,MSFT&timeframe=1Day").await;

    assert_eq!(status, 200);
    let aapl = body["AAPL"].as_array().unwrap();
    assert_eq!(aapl.len(), 2);
    assert_eq!(aapl[0]["source"], "alpaca:iex");
    assert_eq!(aapl[1]["close"].as_f64().unwrap(), 2.5);

    // MSFT was requested but the feed had nothing for it.
    let msft = body["MSFT"].as_array().unwrap();
    assert_eq!(msft.len(), 1);
    assert_eq!(msft[0]["source"], "unavailable");
    assert_eq!(msft[0]["close"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn unknown_timeframe_falls_back_to_daily() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .and(query_param("timeframe", "1Day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bars": {
            "AAPL": [
                {"t": "2024-05-01T04:00:00Z", "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10.0},
            ],
        }})))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) =
        authed_get(app, "/api/market-data/bars?symbols=AAPL&timeframe=2Weeks").await;

    assert_eq!(status, 200);
    // A real series proves the request went upstream as 1Day.
    assert_eq!(body["AAPL"][0]["source"], "alpaca:iex");
}

#[tokio::test]
async fn live_prices_requires_no_auth() {
    let server = MockServer::start().await;
    mock_stock_quotes(
        &server,
        json!({"quotes": {"AAPL": {"bp": 4.0, "ap": 6.0}}}),
    )
    .await;
    mock_stock_snapshots(&server, json!({})).await;

    let app = build_router(test_config(&server.uri()));
    let req = Request::builder()
        .uri("/api/market-data/live-prices?symbols=AAPL")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, 200);
    assert_eq!(body["AAPL"]["price"].as_f64().unwrap(), 5.0);
}

#[tokio::test]
async fn historical_returns_bare_bar_series() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bars": {
            "AAPL": [
                {"t": "2024-05-01T04:00:00Z", "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10.0},
            ],
        }})))
        .mount(&server)
        .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/market-data/AAPL/historical").await;

    assert_eq!(status, 200);
    let series = body.as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["close"].as_f64().unwrap(), 1.5);
}

#[tokio::test]
async fn snapshot_fills_unavailable_symbols() {
    let server = MockServer::start().await;
    mock_identity(&server, TEST_USER).await;
    mock_stock_snapshots(
        &server,
        json!({"AAPL": {
            "latestQuote": {"bp": 10.0, "ap": 12.0},
            "latestTrade": {"p": 11.5, "s": 3.0},
            "dailyBar": {
                "t": "2024-05-01T04:00:00Z",
                "o": 8.0, "h": 13.0, "l": 7.0, "c": 11.0, "v": 1000.0,
            },
        }}),
    )
    .await;

    let app = build_router(test_config(&server.uri()));
    let (status, body) = authed_get(app, "/api/market-data/snapshot?symbols=AAPL,MSFT").await;

    assert_eq!(status, 200);
    assert_eq!(body["AAPL"]["latest_trade"]["price"].as_f64().unwrap(), 11.5);
    assert_eq!(body["AAPL"]["daily_bar"]["close"].as_f64().unwrap(), 11.0);
    assert_eq!(body["MSFT"]["latest_quote"]["bid_price"].as_f64().unwrap(), 0.0);
}
