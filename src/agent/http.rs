//! HTTP implementation of the agent runtime client

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, instrument};

use crate::agent::{AgentClient, UpstreamResponse, DEFAULT_UPSTREAM_CONTENT_TYPE};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::relay::{BoxError, InvocationRequest, StreamHandle};

/// Session header recognized by the agent runtime
const SESSION_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";

/// HTTP client for the agent invocation service
pub struct HttpAgentClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAgentClient {
    /// Create a new agent client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.agent_api_url.clone(),
            api_key: config.agent_api_key.clone(),
        }
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    async fn invoke(
        &self,
        runtime_arn: &str,
        request: &InvocationRequest,
    ) -> AppResult<UpstreamResponse> {
        let url = format!(
            "{}/runtimes/{}/invocations?qualifier=DEFAULT",
            self.base_url, runtime_arn
        );

        debug!(url = %url, "invoking agent runtime");

        let mut builder = self
            .client
            .post(&url)
            .header(SESSION_HEADER, &request.session_id)
            .header(CONTENT_TYPE, &request.content_type)
            .header(ACCEPT, &request.accept)
            .body(request.payload());
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Invocation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Invocation(format!(
                "agent runtime error {status}: {text}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_UPSTREAM_CONTENT_TYPE)
            .to_string();

        debug!(status = %status, content_type = %content_type, "agent runtime responded");

        let stream = response
            .bytes_stream()
            .map_err(|e| Box::new(e) as BoxError);

        Ok(UpstreamResponse {
            content_type,
            body: Some(StreamHandle::Piped(Box::pin(stream))),
        })
    }
}
