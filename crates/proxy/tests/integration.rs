//! End-to-end tests driving the HTTP surface directly, with a `wiremock` stand-in for downstream.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use proxy::downstream::DownstreamClient;
use proxy::queue::PendingQueue;
use proxy::strategy::StrategyRegistry;
use proxy::{build_router, scheduler, AppState};
use proxy_common::config::Strategy;
use proxy_common::metrics::MetricsRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn build_test_app(
    downstream_url: String,
    initial_strategy: Strategy,
) -> (axum::Router, tokio::task::JoinHandle<()>) {
    let metrics: &'static MetricsRegistry = Box::leak(Box::new(MetricsRegistry::new()));
    let queue = Arc::new(PendingQueue::new());
    let strategy = Arc::new(StrategyRegistry::new(initial_strategy));
    let downstream = Arc::new(DownstreamClient::new(downstream_url, None).unwrap());

    let handle = tokio::spawn(scheduler::run(
        queue.clone(),
        strategy.clone(),
        downstream,
        5,
        metrics,
    ));

    let state = Arc::new(AppState {
        queue,
        strategy,
        metrics,
    });

    (build_router(state), handle)
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn proxy_classify_round_trips_through_downstream() {
    let downstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"label": "spam", "score": 0.9}]
        })))
        .mount(&downstream)
        .await;

    let (app, _handle) = build_test_app(format!("{}/classify", downstream.uri()), Strategy::Fcfs).await;

    let (status, body) = post_json(&app, "/proxy_classify", json!("buy now")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "spam");
    assert!(body["proxy_latency_ms"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn proxy_classify_surfaces_downstream_failure_as_bad_gateway() {
    let downstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&downstream)
        .await;

    let (app, _handle) = build_test_app(format!("{}/classify", downstream.uri()), Strategy::Fcfs).await;

    let (status, body) = post_json(&app, "/proxy_classify", json!("buy now")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn strategy_set_then_get_round_trips() {
    let downstream = MockServer::start().await;
    let (app, _handle) =
        build_test_app(format!("{}/classify", downstream.uri()), Strategy::Fcfs).await;

    let (status, body) = post_json(&app, "/strategy", json!("sjf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("sjf"));

    let request = Request::builder()
        .method("GET")
        .uri("/strategy")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, json!("sjf"));
}

#[tokio::test]
async fn setting_unknown_strategy_is_rejected() {
    let downstream = MockServer::start().await;
    let (app, _handle) =
        build_test_app(format!("{}/classify", downstream.uri()), Strategy::Fcfs).await;

    let (status, _body) = post_json(&app, "/strategy", json!("round_robin")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_metrics_endpoints_respond() {
    let downstream = MockServer::start().await;
    let (app, _handle) =
        build_test_app(format!("{}/classify", downstream.uri()), Strategy::Fcfs).await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("proxy_requests_total"));
}

#[tokio::test]
async fn concurrent_requests_are_all_answered() {
    let downstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(|req: &wiremock::Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            let n = body["sequences"].as_array().unwrap().len();
            let results: Vec<Value> = (0..n).map(|_| json!({"label": "ok"})).collect();
            ResponseTemplate::new(200).set_body_json(json!({ "results": results }))
        })
        .mount(&downstream)
        .await;

    let (app, _handle) =
        build_test_app(format!("{}/classify", downstream.uri()), Strategy::Fair).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        let tenant = if i % 2 == 0 { "tenant-a" } else { "tenant-b" };
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .method("POST")
                .uri("/proxy_classify")
                .header("content-type", "application/json")
                .header("X-Customer-Id", tenant)
                .body(Body::from(json!("hello").to_string()))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();
            response.status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
}
