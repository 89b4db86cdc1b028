//! Router construction

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::handlers;
use crate::middleware::rate_limit::RateLimitLayer;
use crate::AppState;

/// Build the HTTP router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut generation = Router::new().route("/generate-images", post(handlers::generate_images));

    if state.settings.rate_limit.enabled {
        generation = generation.route_layer(RateLimitLayer::from_config(&state.settings.rate_limit));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Generation is bounded by the image client timeout and the attempt
    // ceiling, so the request timeout must not cut its retry loop short
    let bounded = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::get_stats))
        .route("/stats/refresh", post(handlers::refresh_stats))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.settings.server.request_timeout_secs,
        )));

    bounded
        .merge(generation)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
