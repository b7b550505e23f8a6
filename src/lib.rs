//! agent-relay - Streaming relay front-end for a managed remote-agent
//! invocation service
//!
//! This library fronts the agent runtime with two HTTP entry points and
//! relays the runtime's streamed response body back to the caller,
//! either on the native response head (direct streaming) or behind a
//! binary metadata envelope (gateway-compatible framing).

pub mod agent;
pub mod config;
pub mod error;
pub mod framing;
pub mod relay;
pub mod routes;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

pub use crate::agent::{AgentClient, HttpAgentClient, UpstreamResponse};
pub use crate::config::Config;
pub use crate::error::{AppError, AppResult};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Agent runtime client, constructed once and reused across
    /// invocations
    pub agent_client: Arc<dyn AgentClient>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // HTTP client with connection pooling
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        let agent_client: Arc<dyn AgentClient> =
            Arc::new(HttpAgentClient::new(http_client, &config));

        Ok(Self {
            config,
            start_time: Instant::now(),
            agent_client,
        })
    }

    /// Create application state with an externally supplied agent
    /// client (used by tests to stub the runtime).
    pub fn with_agent_client(config: Config, agent_client: Arc<dyn AgentClient>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            agent_client,
        }
    }
}
