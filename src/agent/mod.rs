//! Agent runtime client
//!
//! The managed agent invocation service is consumed as a black box: it
//! takes the normalized request and hands back a content type plus an
//! opaque body handle. Its retry and auth policies are its own.

pub mod http;

pub use http::HttpAgentClient;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::relay::{InvocationRequest, StreamHandle};

/// Content type assumed when the runtime omits one
pub const DEFAULT_UPSTREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Upstream response: negotiated content type and the body handle,
/// absent when the runtime sent no body.
pub struct UpstreamResponse {
    pub content_type: String,
    pub body: Option<StreamHandle>,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("content_type", &self.content_type)
            .field("body", &self.body.as_ref().map(StreamHandle::shape))
            .finish()
    }
}

/// Client for the remote agent invocation service.
///
/// Constructed once at startup and shared across requests; per-request
/// state lives in the arguments, never in the client.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Invoke the agent runtime identified by `runtime_arn` with the
    /// normalized request.
    async fn invoke(
        &self,
        runtime_arn: &str,
        request: &InvocationRequest,
    ) -> AppResult<UpstreamResponse>;
}
