//! HTTP routes for the relay
//!
//! This module defines all HTTP endpoints exposed by the service.

pub mod health;
pub mod invoke;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Bidirectional streaming entry point
        .route("/invocations", post(invoke::invoke_direct))
        // Gateway-compatible entry point (prelude framing)
        .route("/gateway/invocations", post(invoke::invoke_gateway))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
