//! Direct framing strategy
//!
//! Status and headers are committed on the native response head,
//! strictly before any body byte. The head is staged at `prepare` and
//! sent when the sink commits its first write (or closes empty), which
//! keeps the error-frame window open until the first byte is actually
//! produced.

use axum::http::StatusCode;
use axum::response::Response;
use tokio::sync::oneshot;

use crate::framing::{error_frame, PendingResponse, ResponseFramer};
use crate::relay::sink::ChannelSink;

/// Framer for the bidirectional streaming entry point.
#[derive(Debug, Default)]
pub struct DirectFramer;

impl DirectFramer {
    pub fn new() -> Self {
        Self
    }
}

impl ResponseFramer for DirectFramer {
    type Sink = ChannelSink;

    fn prepare(
        self,
        status: StatusCode,
        headers: Vec<(String, String)>,
    ) -> (PendingResponse, Self::Sink) {
        let (head_tx, head_rx) = oneshot::channel();
        let sink = ChannelSink::new(status, headers, head_tx);
        (PendingResponse::new(head_rx), sink)
    }

    fn error_frame(self, status: StatusCode, message: &str) -> Response {
        error_frame(status, message)
    }
}
