//! Outbound sinks
//!
//! A [`FrameSink`] is the single destination for one request's response
//! body. It moves through `Unstarted -> Open -> Closed`: the first
//! successful write commits the framing metadata and opens the sink,
//! and a closed sink accepts no further writes.
//!
//! [`ChannelSink`] feeds an axum streaming body through a bounded
//! channel, deferring the response head until the first byte (or an
//! empty close). [`PreludeSink`] decorates another sink with the
//! gateway metadata envelope.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use bytes::{BufMut, Bytes, BytesMut};
use futures::channel::mpsc;
use futures::SinkExt;
use std::convert::Infallible;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::framing::{error_frame, PreludeMetadata};
use crate::relay::RelayError;

/// Channel capacity for in-flight body chunks; writes beyond this
/// block until the client consumes, which is the back-pressure path.
const BODY_CHANNEL_CAPACITY: usize = 16;

/// Writer-only handle for one response body.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one body chunk. The first successful write commits the
    /// framing metadata.
    async fn write(&mut self, chunk: Bytes) -> Result<(), RelayError>;

    /// Close the sink. Idempotent; commits the framing metadata when
    /// nothing was written (an empty body is a valid response).
    async fn close(&mut self) -> Result<(), RelayError>;

    /// Replace the staged response with a structured error frame.
    ///
    /// Returns `false` when response bytes were already committed, in
    /// which case the caller's only recourse is to close and log.
    async fn abort(&mut self, status: StatusCode, message: &str) -> bool;

    /// Token shared with the drain loop; cancelled when the downstream
    /// consumer disconnects.
    fn cancellation(&self) -> CancellationToken;

    /// Body bytes committed so far.
    fn bytes_written(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SinkState {
    Unstarted,
    Open,
    Closed,
}

/// Sink backed by a bounded channel feeding a streaming response body.
///
/// The response head (status + headers, staged at construction) is sent
/// through a oneshot to the waiting handler when the first body byte is
/// written, so pre-first-byte failures can still substitute an error
/// frame.
pub struct ChannelSink {
    state: SinkState,
    status: StatusCode,
    headers: Vec<(String, String)>,
    head_tx: Option<oneshot::Sender<Response>>,
    body_tx: Option<mpsc::Sender<Result<Bytes, Infallible>>>,
    body_rx: Option<mpsc::Receiver<Result<Bytes, Infallible>>>,
    token: CancellationToken,
    bytes_written: u64,
}

impl ChannelSink {
    pub fn new(
        status: StatusCode,
        headers: Vec<(String, String)>,
        head_tx: oneshot::Sender<Response>,
    ) -> Self {
        let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);
        Self {
            state: SinkState::Unstarted,
            status,
            headers,
            head_tx: Some(head_tx),
            body_tx: Some(body_tx),
            body_rx: Some(body_rx),
            token: CancellationToken::new(),
            bytes_written: 0,
        }
    }

    /// Commit the staged head: hand the streaming body to the waiting
    /// handler. No status or header mutation is possible afterwards.
    fn commit_head(&mut self) {
        let Some(head_tx) = self.head_tx.take() else {
            return;
        };
        let Some(body_rx) = self.body_rx.take() else {
            return;
        };

        let mut builder = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match builder.body(Body::from_stream(body_rx)) {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "failed to build response head");
                error_frame(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to build response head",
                )
            }
        };

        // Receiver dropped means the handler is gone; nothing to do.
        let _ = head_tx.send(response);
        self.state = SinkState::Open;
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn write(&mut self, chunk: Bytes) -> Result<(), RelayError> {
        if self.state == SinkState::Closed {
            return Err(RelayError::SinkClosed);
        }
        if self.state == SinkState::Unstarted {
            self.commit_head();
        }

        let Some(body_tx) = self.body_tx.as_mut() else {
            return Err(RelayError::SinkClosed);
        };

        let len = chunk.len() as u64;
        if body_tx.send(Ok(chunk)).await.is_err() {
            // The body stream was dropped: the client disconnected.
            // Cancel so the upstream drain stops promptly.
            self.state = SinkState::Closed;
            self.token.cancel();
            return Err(RelayError::Disconnected);
        }
        self.bytes_written += len;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RelayError> {
        if self.state == SinkState::Closed {
            return Ok(());
        }
        if self.state == SinkState::Unstarted {
            self.commit_head();
        }
        // Dropping the sender terminates the body stream.
        self.body_tx = None;
        self.state = SinkState::Closed;
        Ok(())
    }

    async fn abort(&mut self, status: StatusCode, message: &str) -> bool {
        if self.state != SinkState::Unstarted {
            return false;
        }
        let Some(head_tx) = self.head_tx.take() else {
            return false;
        };
        let _ = head_tx.send(error_frame(status, message));
        self.body_tx = None;
        self.body_rx = None;
        self.state = SinkState::Closed;
        true
    }

    fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// Decorator that prepends the gateway metadata envelope.
///
/// The envelope (serialized metadata followed by the fixed separator)
/// is flushed through the inner sink on the first write, or at close
/// for empty bodies. The inner sink is owned exclusively, so no writer
/// can bypass the envelope.
pub struct PreludeSink<S: FrameSink> {
    inner: S,
    /// Staged metadata; taken when the envelope is flushed.
    metadata: Option<PreludeMetadata>,
}

impl<S: FrameSink> PreludeSink<S> {
    pub fn new(inner: S, metadata: PreludeMetadata) -> Self {
        Self {
            inner,
            metadata: Some(metadata),
        }
    }

    async fn flush_envelope(&mut self) -> Result<(), RelayError> {
        if let Some(metadata) = self.metadata.take() {
            self.inner.write(metadata.envelope()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: FrameSink> FrameSink for PreludeSink<S> {
    async fn write(&mut self, chunk: Bytes) -> Result<(), RelayError> {
        self.flush_envelope().await?;
        self.inner.write(chunk).await
    }

    async fn close(&mut self) -> Result<(), RelayError> {
        self.flush_envelope().await?;
        self.inner.close().await
    }

    async fn abort(&mut self, status: StatusCode, message: &str) -> bool {
        // Once the envelope is on the wire no corrective frame exists.
        let Some(_) = self.metadata.take() else {
            return false;
        };

        let metadata = PreludeMetadata::error(status);
        let payload = serde_json::json!({ "error": message }).to_string();
        let mut frame = BytesMut::from(&metadata.envelope()[..]);
        frame.put(payload.as_bytes());

        if let Err(err) = self.inner.write(frame.freeze()).await {
            debug!(error = %err, "error frame could not be delivered");
        }
        if let Err(err) = self.inner.close().await {
            debug!(error = %err, "failed to close sink after error frame");
        }
        true
    }

    fn cancellation(&self) -> CancellationToken {
        self.inner.cancellation()
    }

    fn bytes_written(&self) -> u64 {
        self.inner.bytes_written()
    }
}
