//! Relay orchestration
//!
//! The per-request sequence shared by both entry points: check the
//! configured runtime identifier, normalize the request, invoke the
//! agent, then frame and stream the upstream body. Every pre-stream
//! failure becomes a structured error frame; a streaming failure is
//! converted only while no response bytes have been committed.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use bytes::Bytes;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::framing::ResponseFramer;
use crate::relay::sink::FrameSink;
use crate::relay::stream::relay;
use crate::relay::InvocationRequest;
use crate::AppState;

/// Handle one invocation request end to end.
pub async fn handle_invocation<F>(state: Arc<AppState>, raw: Bytes, framer: F) -> Response
where
    F: ResponseFramer,
{
    // Config precondition: without a runtime identifier there is
    // nothing to invoke, and the agent must not be called.
    let Some(runtime_arn) = state.config.agent_runtime_arn.clone() else {
        let err = AppError::Config("AGENT_RUNTIME_ARN environment variable not set".to_string());
        return framer.error_frame(err.status(), &err.to_string());
    };

    let request = match InvocationRequest::from_envelope(&raw) {
        Ok(request) => request,
        Err(err) => return framer.error_frame(err.status(), &err.to_string()),
    };

    info!(session_id = %request.session_id, "invoking agent runtime");

    let upstream = match state.agent_client.invoke(&runtime_arn, &request).await {
        Ok(upstream) => upstream,
        Err(err) => {
            error!(session_id = %request.session_id, error = %err, "agent invocation failed");
            return framer.error_frame(err.status(), &err.to_string());
        }
    };

    let headers = vec![
        ("Content-Type".to_string(), upstream.content_type.clone()),
        ("X-Session-Id".to_string(), request.session_id.clone()),
    ];
    let (pending, mut sink) = framer.prepare(StatusCode::OK, headers);

    let session_id = request.session_id;
    let shape = upstream.body.as_ref().map(|b| b.shape()).unwrap_or("none");
    debug!(session_id = %session_id, shape = shape, content_type = %upstream.content_type, "relaying upstream body");

    tokio::spawn(async move {
        let token = sink.cancellation();
        if let Err(err) = relay(upstream.body, &mut sink, &token).await {
            // Convertible only while nothing has been committed;
            // otherwise the response is truncated and the error goes to
            // the diagnostic channel alone.
            let err = AppError::Relay(err);
            if !sink.abort(err.status(), &err.to_string()).await {
                error!(session_id = %session_id, error = %err, "response truncated after streaming began");
                if let Err(close_err) = sink.close().await {
                    debug!(session_id = %session_id, error = %close_err, "sink close failed after relay error");
                }
            }
        }
    });

    pending.wait().await
}
