//! Response relay core
//!
//! Normalizes an inbound invocation request, drains an upstream body of
//! variant shape into an ordered byte-chunk sequence, and writes it to
//! a framed sink. The framing strategies themselves live in
//! [`crate::framing`].

pub mod orchestrate;
pub mod request;
pub mod sink;
pub mod stream;

pub use request::InvocationRequest;
pub use sink::{ChannelSink, FrameSink, PreludeSink};
pub use stream::{relay, BoxError, ByteStream, StreamHandle};

use thiserror::Error;

/// Errors raised while draining an upstream body into the sink.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The upstream body produced an error mid-stream.
    #[error("Error streaming response: {0}")]
    Upstream(String),

    /// The downstream consumer went away before the relay finished.
    #[error("client disconnected during streaming")]
    Disconnected,

    /// The relay was cancelled before the upstream body was exhausted.
    #[error("relay cancelled")]
    Cancelled,

    /// A write was attempted against a closed sink.
    #[error("write to a closed sink")]
    SinkClosed,
}
