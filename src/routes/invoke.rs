//! Invocation entry points
//!
//! Both handlers run the same relay sequence; they differ only in the
//! framing strategy handed to the orchestrator.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Response};

use crate::framing::{DirectFramer, PreludeFramer};
use crate::relay::orchestrate::handle_invocation;
use crate::AppState;

/// Direct streaming entry point: status and headers on the native
/// response head, body streamed raw.
pub async fn invoke_direct(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    handle_invocation(state, body, DirectFramer::new()).await
}

/// Gateway-compatible entry point: metadata envelope ahead of the body.
pub async fn invoke_gateway(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    handle_invocation(state, body, PreludeFramer::new()).await
}
