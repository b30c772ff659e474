use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stock_history_api::build_app;
use stock_history_api::clock::MockClock;
use stock_history_api::middleware::QUOTA_EXCEEDED_BODY;
use stock_history_api::models::Company;
use stock_history_api::rate_limit::GateConfig;
use stock_history_api::state::AppState;
use stock_history_api::store::StockStore;
use tower::util::ServiceExt;

const API_KEY: &str = "quota-key";
const STOCKS_URI: &str = "/api/v1/stocks/single?companyCode=AAPL&startDate=2024-01-01&endDate=2024-01-31";

fn app_with_clock(limit: usize, window: Duration) -> (Router, MockClock) {
    let (app, clock, _) = app_with_state(limit, window);
    (app, clock)
}

fn app_with_state(limit: usize, window: Duration) -> (Router, MockClock, AppState) {
    let store = StockStore::new(
        vec![Company {
            company_code: "AAPL".into(),
            company_name: "Apple Inc.".into(),
        }],
        Vec::new(),
    )
    .unwrap();
    let clock = MockClock::new(Instant::now());
    let gate = GateConfig {
        limit,
        window,
        ..GateConfig::default()
    };
    let state = AppState::with_clock(store, API_KEY, gate, Arc::new(clock.clone()));
    (build_app(state.clone()), clock, state)
}

async fn call(app: &Router, api_key: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(STOCKS_URI);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

#[tokio::test]
async fn over_quota_call_gets_429_with_fixed_body() {
    let (app, _clock) = app_with_clock(10, Duration::from_secs(10));

    for _ in 0..10 {
        assert_eq!(call(&app, Some(API_KEY)).await.status(), StatusCode::OK);
    }

    let response = call(&app, Some(API_KEY)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], QUOTA_EXCEEDED_BODY.as_bytes());
}

#[tokio::test]
async fn quota_recovers_once_window_slides() {
    let (app, clock) = app_with_clock(2, Duration::from_secs(10));

    assert_eq!(call(&app, Some(API_KEY)).await.status(), StatusCode::OK);
    assert_eq!(call(&app, Some(API_KEY)).await.status(), StatusCode::OK);

    clock.advance(Duration::from_millis(9_999));
    assert_eq!(call(&app, Some(API_KEY)).await.status(), StatusCode::TOO_MANY_REQUESTS);

    clock.advance(Duration::from_millis(2));
    assert_eq!(call(&app, Some(API_KEY)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_keys_are_still_charged() {
    let (app, _clock) = app_with_clock(1, Duration::from_secs(10));

    assert_eq!(call(&app, Some("wrong")).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(call(&app, Some("wrong")).await.status(), StatusCode::TOO_MANY_REQUESTS);

    // a different key has its own window
    assert_eq!(call(&app, Some(API_KEY)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn calls_without_header_bypass_the_gate() {
    let (app, _clock) = app_with_clock(1, Duration::from_secs(10));

    for _ in 0..5 {
        assert_eq!(call(&app, None).await.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn rejected_calls_skip_parameter_validation() {
    let (app, _clock) = app_with_clock(1, Duration::from_secs(10));

    assert_eq!(call(&app, Some(API_KEY)).await.status(), StatusCode::OK);

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/stocks/single")
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn empty_header_bypasses_the_gate() {
    let (app, _clock, state) = app_with_state(1, Duration::from_secs(10));

    for _ in 0..3 {
        assert_eq!(call(&app, Some("")).await.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(state.gate.tracked_identities(), 0);
}
