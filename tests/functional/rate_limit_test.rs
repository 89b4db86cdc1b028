//! Functional tests for rate limiting

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use forge_relay::config::RateLimitConfig;
use forge_relay::middleware::rate_limit::RateLimitLayer;
use serde_json::Value;
use tower::ServiceExt;

fn create_test_app(rpm: u32, burst: u32) -> Router {
    let limited = Router::new()
        .route("/generate-images", post(|| async { "OK" }))
        .route_layer(RateLimitLayer::per_minute(rpm, burst));

    Router::new()
        .route("/health", get(|| async { "healthy" }))
        .merge(limited)
}

fn generate_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-images")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limit_allows_within_burst() {
    let app = create_test_app(60, 3);

    for _ in 0..3 {
        let response = app.clone().oneshot(generate_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_rate_limit_rejects_over_burst() {
    let app = create_test_app(1, 1);

    let first = app.clone().oneshot(generate_request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(generate_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let bytes = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["type"], "rate_limit_error");
    assert_eq!(body["error"]["code"], "rate_limit_exceeded");
}

#[tokio::test]
async fn test_unlimited_routes_bypass() {
    let app = create_test_app(1, 1);

    let _ = app.clone().oneshot(generate_request()).await.unwrap();

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_layer_from_config() {
    let config = RateLimitConfig {
        enabled: true,
        requests_per_minute: 10,
        burst_size: 2,
    };
    let app = Router::new()
        .route("/generate-images", post(|| async { "OK" }))
        .route_layer(RateLimitLayer::from_config(&config));

    let statuses = [
        app.clone().oneshot(generate_request()).await.unwrap().status(),
        app.clone().oneshot(generate_request()).await.unwrap().status(),
        app.oneshot(generate_request()).await.unwrap().status(),
    ];

    assert_eq!(
        statuses,
        [StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );
}
