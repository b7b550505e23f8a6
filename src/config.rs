//! Configuration management for the relay
//!
//! Configuration is loaded from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Identifier of the agent runtime to invoke.
    ///
    /// Optional at load time: the original deployment answers each
    /// request with a 500 error frame when it is missing, so startup
    /// must not fail on its absence.
    pub agent_runtime_arn: Option<String>,

    /// Base URL of the agent invocation service
    pub agent_api_url: String,
    /// Bearer token for the agent invocation service
    pub agent_api_key: Option<String>,

    /// Upstream request timeout (in seconds)
    pub request_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("RELAY_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,

            agent_runtime_arn: env::var("AGENT_RUNTIME_ARN").ok(),

            agent_api_url: env::var("AGENT_API_URL").unwrap_or_else(|_| {
                "https://bedrock-agentcore.us-east-1.amazonaws.com".to_string()
            }),
            agent_api_key: env::var("AGENT_API_KEY").ok(),

            request_timeout_seconds: env::var("RELAY_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid RELAY_TIMEOUT_SECONDS")?,
        })
    }
}
