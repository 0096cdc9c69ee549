//! Router-level tests: password gate, session cookie, HTML and JSON renders
//! against synthetic data and a stub brokerage.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use quantlogix::app::create_app;
use quantlogix::config::SyntheticConfig;
use quantlogix::external::brokerage::{BrokerageError, BrokerageProvider};
use quantlogix::models::{AccountSnapshot, EquityPoint, HistoryRequest, Position};
use quantlogix::services::session_store::SessionStore;
use quantlogix::state::{AppState, DataSource};

const PASSWORD: &str = "correct horse battery staple";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StubBrokerage {
    fail_account: bool,
    fail_history: bool,
    last_equity: f64,
}

#[async_trait]
impl BrokerageProvider for StubBrokerage {
    fn is_paper(&self) -> bool {
        true
    }

    async fn fetch_account(&self) -> Result<AccountSnapshot, BrokerageError> {
        if self.fail_account {
            return Err(BrokerageError::Network("connection refused".into()));
        }
        Ok(AccountSnapshot::new(10_500.0, self.last_equity, 2_000.0))
    }

    async fn fetch_positions(&self) -> Result<Vec<Position>, BrokerageError> {
        Ok(vec![
            Position {
                symbol: "AAPL".to_string(),
                quantity: 100,
                entry_price: 150.25,
                current_price: 155.5,
                market_value: 15550.0,
                unrealized_pl: 525.0,
                unrealized_pl_pct: 3.49,
            },
            Position::from_prices("MSFT", 10, 400.0, 390.0),
        ])
    }

    async fn fetch_portfolio_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<Vec<EquityPoint>, BrokerageError> {
        if self.fail_history {
            return Err(BrokerageError::BadResponse("HTTP 500 from history".into()));
        }
        Ok((0..5)
            .map(|i| EquityPoint::new(request.end - Duration::days(4 - i), 10_000.0 + 100.0 * i as f64))
            .collect())
    }
}

fn synthetic_app() -> Router {
    synthetic_app_with(SessionStore::new(PASSWORD))
}

fn synthetic_app_with(sessions: SessionStore) -> Router {
    create_app(AppState::new(sessions, DataSource::Synthetic(SyntheticConfig::default())))
}

fn brokerage_app(stub: StubBrokerage) -> Router {
    create_app(AppState::new(
        SessionStore::new(PASSWORD),
        DataSource::Brokerage(Arc::new(stub)),
    ))
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> Option<&str> {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

/// `name=value` part of the Set-Cookie header, ready to send back.
fn cookie_pair(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

async fn post_password(app: &Router, password: &str, cookie: Option<&str>) -> Response {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("password", password)
        .finish();
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone().oneshot(builder.body(Body::from(body)).unwrap()).await.unwrap()
}

async fn logged_in_cookie(app: &Router) -> String {
    let response = post_password(app, PASSWORD, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
    cookie_pair(&response).expect("login should issue a session cookie")
}

// ---------------------------------------------------------------------------
// Access gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public() {
    let app = synthetic_app();
    let response = get(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn dashboard_redirects_to_login_without_session() {
    let app = synthetic_app();
    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn api_returns_401_without_session() {
    let app = synthetic_app();
    let response = get(&app, "/api/snapshot", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_page_issues_cookie_and_masks_input() {
    let app = synthetic_app();
    let response = get(&app, "/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cookie_pair(&response).unwrap().starts_with("quantlogix_session="));

    let html = body_text(response).await;
    assert!(html.contains("Please enter the password"));
    assert!(html.contains(r#"type="password""#));
    assert!(!html.contains("Password incorrect"));
}

#[tokio::test]
async fn wrong_password_shows_error_and_stays_locked() {
    let app = synthetic_app();
    let first = get(&app, "/login", None).await;
    let cookie = cookie_pair(&first).unwrap();

    let response = post_password(&app, "hunter2", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    // Existing session, no new cookie
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let page = body_text(get(&app, "/login", Some(&cookie)).await).await;
    assert!(page.contains("Password incorrect"));

    let dashboard = get(&app, "/", Some(&cookie)).await;
    assert_eq!(dashboard.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn rejected_session_can_still_log_in() {
    let app = synthetic_app();
    let first = post_password(&app, "nope", None).await;
    let cookie = cookie_pair(&first).unwrap();

    let second = post_password(&app, PASSWORD, Some(&cookie)).await;
    assert_eq!(location(&second), Some("/"));
    let accepted = cookie_pair(&second).expect("acceptance should reissue the cookie");
    assert_ne!(accepted, cookie);

    let dashboard = get(&app, "/", Some(&accepted)).await;
    assert_eq!(dashboard.status(), StatusCode::OK);

    // The pre-login id does not carry the acceptance
    let stale = get(&app, "/", Some(&cookie)).await;
    assert_eq!(stale.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn anonymous_traffic_does_not_grow_sessions() {
    let sessions = SessionStore::with_rejected_limit(PASSWORD, 5);
    let app = synthetic_app_with(sessions.clone());

    for _ in 0..50 {
        let response = get(&app, "/login", None).await;
        assert!(cookie_pair(&response).is_some());
    }
    for _ in 0..20 {
        get(&app, "/", None).await;
    }
    assert_eq!(sessions.len(), 0);

    for _ in 0..20 {
        let response = post_password(&app, "wrong", None).await;
        assert_eq!(location(&response), Some("/login"));
    }
    assert_eq!(sessions.len(), 5);

    let _cookie = logged_in_cookie(&app).await;
    assert_eq!(sessions.len(), 6);
}

#[tokio::test]
async fn sessions_do_not_share_authentication() {
    let app = synthetic_app();
    let _alice = logged_in_cookie(&app).await;

    let bob = cookie_pair(&get(&app, "/login", None).await).unwrap();
    let response = get(&app, "/", Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_page_redirects_once_accepted() {
    let app = synthetic_app();
    let cookie = logged_in_cookie(&app).await;
    let response = get(&app, "/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

// ---------------------------------------------------------------------------
// Synthetic renders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn synthetic_dashboard_renders_all_sections() {
    let app = synthetic_app();
    let cookie = logged_in_cookie(&app).await;

    let response = get(&app, "/?period=3M", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains("Welcome to QuantLogix"));
    assert!(html.contains("Real-time Portfolio Tracking"));
    assert!(html.contains("Market Analytics"));
    assert!(html.contains("Getting Started"));
    assert!(html.contains("Connect your Alpaca trading account"));
    assert!(html.contains("System Status: Operational"));
    assert!(html.contains("Synthetic Data"));
    assert!(html.contains("Portfolio Value"));
    assert!(html.contains("Volatility (Ann.)"));
    assert!(html.contains("<svg"));
    assert!(html.contains("<table>"));
    assert!(html.contains(r#"class="active">3M</a>"#));
}

#[tokio::test]
async fn invalid_period_renders_error_block() {
    let app = synthetic_app();
    let cookie = logged_in_cookie(&app).await;

    let response = get(&app, "/?period=7Y", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Unknown period"));
}

#[tokio::test]
async fn snapshot_json_is_stable_between_renders() {
    let app = synthetic_app();
    let cookie = logged_in_cookie(&app).await;

    let first = body_text(get(&app, "/api/snapshot?period=1M", Some(&cookie)).await).await;
    let second = body_text(get(&app, "/api/snapshot?period=1M", Some(&cookie)).await).await;
    let a: serde_json::Value = serde_json::from_str(&first).unwrap();
    let b: serde_json::Value = serde_json::from_str(&second).unwrap();

    assert_eq!(a["source"], "synthetic");
    assert_eq!(a["period"], "1M");
    assert_eq!(a["chart"].as_array().unwrap().len(), 30);
    assert_eq!(a["metrics"], b["metrics"]);
}

#[tokio::test]
async fn positions_endpoint_applies_filters() {
    let app = synthetic_app();
    let cookie = logged_in_cookie(&app).await;

    let response = get(&app, "/api/positions?symbols=AAPL&symbols=MSFT", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    let symbols: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["symbol"].as_str().unwrap())
        .collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT"]);
}

// ---------------------------------------------------------------------------
// Brokerage renders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn live_dashboard_formats_positions() {
    let app = brokerage_app(StubBrokerage {
        last_equity: 10_000.0,
        ..Default::default()
    });
    let cookie = logged_in_cookie(&app).await;

    let html = body_text(get(&app, "/", Some(&cookie)).await).await;
    assert!(html.contains("Paper Trading"));
    assert!(html.contains("Buying Power"));
    assert!(html.contains("$155.50"));
    assert!(html.contains("$15,550.00"));
    assert!(html.contains("$525.00"));
    assert!(html.contains("+3.49%"));
    assert!(html.contains("+5.00%"));
}

#[tokio::test]
async fn live_snapshot_with_zero_last_equity_has_zero_daily_pct() {
    let app = brokerage_app(StubBrokerage::default());
    let cookie = logged_in_cookie(&app).await;

    let body = body_text(get(&app, "/api/snapshot", Some(&cookie)).await).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["metrics"]["daily_change_pct"].as_f64(), Some(0.0));
    assert_eq!(json["metrics"]["daily_change"].as_f64(), Some(10_500.0));
}

#[tokio::test]
async fn history_failure_degrades_without_halting() {
    let app = brokerage_app(StubBrokerage {
        last_equity: 10_000.0,
        fail_history: true,
        ..Default::default()
    });
    let cookie = logged_in_cookie(&app).await;

    let response = get(&app, "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("System Status: Degraded"));
    assert!(html.contains("Performance history unavailable"));
    assert!(html.contains("No performance history available"));
    assert!(html.contains("AAPL"));
}

#[tokio::test]
async fn account_failure_halts_render_with_error_block() {
    let app = brokerage_app(StubBrokerage {
        fail_account: true,
        ..Default::default()
    });
    let cookie = logged_in_cookie(&app).await;

    let response = get(&app, "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("Unable to load portfolio data"));
    assert!(html.contains("connection refused"));

    let api = get(&app, "/api/snapshot", Some(&cookie)).await;
    assert_eq!(api.status(), StatusCode::BAD_GATEWAY);

    // The service is still up for the next render
    let health = get(&app, "/health", None).await;
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn history_request_ends_today() {
    let app = brokerage_app(StubBrokerage {
        last_equity: 10_000.0,
        ..Default::default()
    });
    let cookie = logged_in_cookie(&app).await;

    let body = body_text(get(&app, "/api/snapshot?period=1W", Some(&cookie)).await).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let chart = json["chart"].as_array().unwrap();
    assert_eq!(chart.len(), 5);
    assert_eq!(
        chart.last().unwrap()["date"].as_str().unwrap(),
        Utc::now().date_naive().format("%Y-%m-%d").to_string()
    );
    assert!(json["metrics"]["volatility"].as_f64().is_some());
}
