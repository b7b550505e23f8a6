//! Stream adapter
//!
//! Upstream SDKs expose the same logical concept, a stream of body
//! bytes, through different capability surfaces depending on version
//! and transport. [`StreamHandle`] pins those down as an explicit sum
//! type resolved once at response receipt, and [`relay`] drains exactly
//! one of them into a sink.

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::relay::sink::FrameSink;
use crate::relay::RelayError;

/// Boxed error for upstream body failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed byte stream, the push-pipeable shape
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Opaque, single-consumption upstream response body.
///
/// Exactly one variant per response; dispatch is a one-shot pattern
/// match, not a fallback chain.
pub enum StreamHandle {
    /// Back-pressured byte stream piped chunk by chunk into the sink
    Piped(ByteStream),
    /// Pull iteration: one chunk per receive until the channel drains
    Chunks(mpsc::Receiver<Result<Bytes, BoxError>>),
    /// Whole body materialized as a byte buffer in a single call
    Buffered(BoxFuture<'static, Result<Bytes, BoxError>>),
    /// Whole body materialized as text in a single call
    Text(BoxFuture<'static, Result<String, BoxError>>),
}

impl StreamHandle {
    /// Shape name for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            StreamHandle::Piped(_) => "piped",
            StreamHandle::Chunks(_) => "chunks",
            StreamHandle::Buffered(_) => "buffered",
            StreamHandle::Text(_) => "text",
        }
    }
}

/// Drain `handle` exactly once into `sink`, in upstream production
/// order, then close the sink.
///
/// An absent handle closes the sink with zero bytes written, which is
/// a valid response. On error the sink is left unclosed: the caller
/// owns the post-failure policy (error frame vs. terminate).
///
/// The token is observed before every upstream read so a downstream
/// disconnect stops the drain promptly instead of consuming a body no
/// one will read.
pub async fn relay<S: FrameSink>(
    handle: Option<StreamHandle>,
    sink: &mut S,
    token: &CancellationToken,
) -> Result<(), RelayError> {
    let Some(handle) = handle else {
        sink.close().await?;
        return Ok(());
    };

    match handle {
        StreamHandle::Piped(mut stream) => loop {
            let chunk = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RelayError::Cancelled),
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => sink.write(bytes).await?,
                Some(Err(err)) => return Err(RelayError::Upstream(err.to_string())),
                None => break,
            }
        },
        StreamHandle::Chunks(mut receiver) => loop {
            let chunk = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RelayError::Cancelled),
                chunk = receiver.recv() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => sink.write(bytes).await?,
                Some(Err(err)) => return Err(RelayError::Upstream(err.to_string())),
                None => break,
            }
        },
        StreamHandle::Buffered(accessor) => {
            let bytes = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RelayError::Cancelled),
                result = accessor => result.map_err(|e| RelayError::Upstream(e.to_string()))?,
            };
            sink.write(bytes).await?;
        }
        StreamHandle::Text(accessor) => {
            let text = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RelayError::Cancelled),
                result = accessor => result.map_err(|e| RelayError::Upstream(e.to_string()))?,
            };
            sink.write(Bytes::from(text)).await?;
        }
    }

    sink.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use futures::stream;
    use std::io;

    /// Sink double that records writes and lifecycle calls.
    #[derive(Default)]
    struct RecordingSink {
        chunks: Vec<Bytes>,
        closes: usize,
        token: CancellationToken,
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn write(&mut self, chunk: Bytes) -> Result<(), RelayError> {
            self.chunks.push(chunk);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), RelayError> {
            self.closes += 1;
            Ok(())
        }

        async fn abort(&mut self, _status: StatusCode, _message: &str) -> bool {
            false
        }

        fn cancellation(&self) -> CancellationToken {
            self.token.clone()
        }

        fn bytes_written(&self) -> u64 {
            self.chunks.iter().map(|c| c.len() as u64).sum()
        }
    }

    fn boxed_err(message: &str) -> BoxError {
        Box::new(io::Error::new(io::ErrorKind::Other, message.to_string()))
    }

    fn piped(chunks: Vec<Result<Bytes, BoxError>>) -> StreamHandle {
        StreamHandle::Piped(Box::pin(stream::iter(chunks)))
    }

    #[tokio::test]
    async fn test_piped_preserves_order() {
        let handle = piped(vec![
            Ok(Bytes::from_static(b"data: a\n\n")),
            Ok(Bytes::from_static(b"data: b\n\n")),
            Ok(Bytes::from_static(b"data: c\n\n")),
        ]);
        let mut sink = RecordingSink::default();
        let token = CancellationToken::new();

        relay(Some(handle), &mut sink, &token).await.unwrap();

        assert_eq!(sink.chunks, vec!["data: a\n\n", "data: b\n\n", "data: c\n\n"]);
        assert_eq!(sink.closes, 1);
    }

    #[tokio::test]
    async fn test_chunks_preserves_order() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(Bytes::from_static(b"one"))).await.unwrap();
        tx.send(Ok(Bytes::from_static(b"two"))).await.unwrap();
        drop(tx);

        let mut sink = RecordingSink::default();
        let token = CancellationToken::new();
        relay(Some(StreamHandle::Chunks(rx)), &mut sink, &token)
            .await
            .unwrap();

        assert_eq!(sink.chunks, vec!["one", "two"]);
        assert_eq!(sink.closes, 1);
    }

    #[tokio::test]
    async fn test_buffered_single_chunk() {
        let handle = StreamHandle::Buffered(Box::pin(async {
            Ok(Bytes::from_static(b"entire body"))
        }));
        let mut sink = RecordingSink::default();
        let token = CancellationToken::new();

        relay(Some(handle), &mut sink, &token).await.unwrap();

        assert_eq!(sink.chunks, vec!["entire body"]);
        assert_eq!(sink.closes, 1);
    }

    #[tokio::test]
    async fn test_text_single_chunk() {
        let handle =
            StreamHandle::Text(Box::pin(async { Ok("entire body as text".to_string()) }));
        let mut sink = RecordingSink::default();
        let token = CancellationToken::new();

        relay(Some(handle), &mut sink, &token).await.unwrap();

        assert_eq!(sink.chunks, vec!["entire body as text"]);
        assert_eq!(sink.closes, 1);
    }

    #[tokio::test]
    async fn test_absent_handle_closes_with_zero_bytes() {
        let mut sink = RecordingSink::default();
        let token = CancellationToken::new();

        relay(None, &mut sink, &token).await.unwrap();

        assert!(sink.chunks.is_empty());
        assert_eq!(sink.closes, 1);
        assert_eq!(sink.bytes_written(), 0);
    }

    #[tokio::test]
    async fn test_mid_stream_error_stops_drain() {
        let handle = piped(vec![
            Ok(Bytes::from_static(b"first")),
            Err(boxed_err("connection reset")),
            Ok(Bytes::from_static(b"never delivered")),
        ]);
        let mut sink = RecordingSink::default();
        let token = CancellationToken::new();

        let err = relay(Some(handle), &mut sink, &token).await.unwrap_err();

        assert!(matches!(err, RelayError::Upstream(_)));
        assert_eq!(sink.chunks, vec!["first"]);
        // The caller decides how to finish; relay must not close here.
        assert_eq!(sink.closes, 0);
    }

    #[tokio::test]
    async fn test_cancellation_stops_piped_drain() {
        let handle = StreamHandle::Piped(Box::pin(stream::pending()));
        let mut sink = RecordingSink::default();
        let token = CancellationToken::new();
        token.cancel();

        let err = relay(Some(handle), &mut sink, &token).await.unwrap_err();
        assert!(matches!(err, RelayError::Cancelled));
        assert_eq!(sink.closes, 0);
    }

    #[tokio::test]
    async fn test_cancellation_stops_chunks_drain() {
        let (_tx, rx) = mpsc::channel::<Result<Bytes, BoxError>>(1);
        let mut sink = RecordingSink::default();
        let token = CancellationToken::new();
        token.cancel();

        let err = relay(Some(StreamHandle::Chunks(rx)), &mut sink, &token)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Cancelled));
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(piped(vec![]).shape(), "piped");
        let (_tx, rx) = mpsc::channel::<Result<Bytes, BoxError>>(1);
        assert_eq!(StreamHandle::Chunks(rx).shape(), "chunks");
    }
}
