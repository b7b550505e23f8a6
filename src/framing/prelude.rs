//! Prelude framing strategy
//!
//! Gateway-compatible transports cannot consume native streaming
//! heads; they expect the response to open with a serialized metadata
//! record (status code plus header map) followed by a fixed
//! eight-byte separator, and only then the raw body bytes. The outer
//! HTTP head is a constant 200 octet-stream; the real status travels
//! inside the envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::oneshot;

use crate::framing::{PendingResponse, ResponseFramer};
use crate::relay::sink::{ChannelSink, PreludeSink};

/// Separator between the metadata record and the body bytes.
pub const PRELUDE_SEPARATOR: [u8; 8] = [0u8; 8];

/// Content type of the outer, envelope-carrying response
const OUTER_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata record serialized ahead of the body.
///
/// Header keys are unique and keep their canonical casing; the map is
/// ordered so the serialized form is deterministic.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreludeMetadata {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
}

impl PreludeMetadata {
    pub fn new(status: StatusCode, headers: Vec<(String, String)>) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: headers.into_iter().collect(),
        }
    }

    /// Metadata for an error frame: JSON payload, no extra headers.
    pub fn error(status: StatusCode) -> Self {
        Self::new(
            status,
            vec![("Content-Type".to_string(), "application/json".to_string())],
        )
    }

    /// The envelope bytes: compact JSON metadata plus the separator.
    /// Built exactly once per response, ahead of all body bytes.
    pub fn envelope(&self) -> Bytes {
        let metadata =
            serde_json::to_vec(self).expect("prelude metadata always serializes");
        let mut buf = BytesMut::with_capacity(metadata.len() + PRELUDE_SEPARATOR.len());
        buf.put(metadata.as_slice());
        buf.put(&PRELUDE_SEPARATOR[..]);
        buf.freeze()
    }
}

/// Framer for the gateway-compatible entry point.
#[derive(Debug, Default)]
pub struct PreludeFramer;

impl PreludeFramer {
    pub fn new() -> Self {
        Self
    }

    fn outer_head() -> Vec<(String, String)> {
        vec![("Content-Type".to_string(), OUTER_CONTENT_TYPE.to_string())]
    }
}

impl ResponseFramer for PreludeFramer {
    type Sink = PreludeSink<ChannelSink>;

    fn prepare(
        self,
        status: StatusCode,
        headers: Vec<(String, String)>,
    ) -> (PendingResponse, Self::Sink) {
        let (head_tx, head_rx) = oneshot::channel();
        let inner = ChannelSink::new(StatusCode::OK, Self::outer_head(), head_tx);
        let metadata = PreludeMetadata::new(status, headers);
        (PendingResponse::new(head_rx), PreludeSink::new(inner, metadata))
    }

    fn error_frame(self, status: StatusCode, message: &str) -> Response {
        // Error frames still travel inside the envelope so the gateway
        // can recover the real status.
        let metadata = PreludeMetadata::error(status);
        let payload = serde_json::json!({ "error": message }).to_string();

        let envelope = metadata.envelope();
        let mut body = BytesMut::with_capacity(envelope.len() + payload.len());
        body.put(&envelope[..]);
        body.put(payload.as_bytes());

        (
            StatusCode::OK,
            [("Content-Type", OUTER_CONTENT_TYPE)],
            body.freeze(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metadata_serialized_form() {
        let metadata = PreludeMetadata::new(
            StatusCode::OK,
            vec![
                ("Content-Type".to_string(), "text/event-stream".to_string()),
                ("X-Session-Id".to_string(), "session-abc".to_string()),
            ],
        );
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"statusCode":200,"headers":{"Content-Type":"text/event-stream","X-Session-Id":"session-abc"}}"#
        );
    }

    #[test]
    fn test_envelope_ends_with_separator() {
        let metadata = PreludeMetadata::new(StatusCode::OK, vec![]);
        let envelope = metadata.envelope();
        assert!(envelope.ends_with(&PRELUDE_SEPARATOR));
        let json = &envelope[..envelope.len() - PRELUDE_SEPARATOR.len()];
        assert_eq!(json, br#"{"statusCode":200,"headers":{}}"#);
    }

    #[tokio::test]
    async fn test_error_frame_wraps_payload_in_envelope() {
        let framer = PreludeFramer::new();
        let response = framer.error_frame(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AGENT_RUNTIME_ARN environment variable not set",
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            OUTER_CONTENT_TYPE
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let expected = PreludeMetadata::error(StatusCode::INTERNAL_SERVER_ERROR).envelope();
        assert!(body.starts_with(&expected));
        assert_eq!(
            &body[expected.len()..],
            br#"{"error":"AGENT_RUNTIME_ARN environment variable not set"}"#
        );
    }
}
