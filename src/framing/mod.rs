//! Response framing strategies
//!
//! Two mutually incompatible ways of committing status, headers, and
//! body bytes, selected by which entry point received the request:
//! [`DirectFramer`] uses the native response head, [`PreludeFramer`]
//! prepends a binary metadata envelope for gateway-compatible
//! transports.
//!
//! A framer is one-shot: `prepare` consumes it and returns a
//! writer-only sink, so no status or header mutation is reachable once
//! streaming may begin.

pub mod direct;
pub mod prelude;

pub use direct::DirectFramer;
pub use prelude::{PreludeFramer, PreludeMetadata, PRELUDE_SEPARATOR};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tokio::sync::oneshot;

use crate::relay::sink::FrameSink;

/// Framing strategy for one response.
pub trait ResponseFramer: Send {
    type Sink: FrameSink + 'static;

    /// Commit (or stage) status and headers and return the writer-only
    /// sink for body bytes. Header names keep their supplied casing so
    /// serialized framings reproduce them verbatim.
    fn prepare(self, status: StatusCode, headers: Vec<(String, String)>)
        -> (PendingResponse, Self::Sink);

    /// Emit a structured error frame. Only valid while nothing has been
    /// streamed, which consuming `self` before `prepare` guarantees.
    fn error_frame(self, status: StatusCode, message: &str) -> Response;
}

/// Response head that resolves once the relay commits its first byte,
/// closes with an empty body, or aborts to an error frame.
pub struct PendingResponse {
    head_rx: oneshot::Receiver<Response>,
}

impl PendingResponse {
    pub(crate) fn new(head_rx: oneshot::Receiver<Response>) -> Self {
        Self { head_rx }
    }

    /// Wait for the committed response.
    pub async fn wait(self) -> Response {
        match self.head_rx.await {
            Ok(response) => response,
            // The sink was dropped without committing anything; the
            // client has seen no bytes, so a plain error frame is safe.
            Err(_) => error_frame(
                StatusCode::INTERNAL_SERVER_ERROR,
                "relay ended before a response was produced",
            ),
        }
    }
}

/// Build the structured JSON error frame shared by both strategies.
pub(crate) fn error_frame(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
