//! Error types for the relay
//!
//! The four-way taxonomy mirrors the stages of a relay: configuration,
//! request validation, agent invocation, and body streaming. The first
//! three always happen before any response byte is committed, so they
//! are always convertible into a structured error frame. `Relay` errors
//! are conditionally convertible; the orchestrator decides.

use axum::http::StatusCode;
use thiserror::Error;

use crate::relay::RelayError;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Required configuration is missing. Pre-stream, maps to 500.
    #[error("{0}")]
    Config(String),

    /// Malformed or incomplete request. Pre-stream, maps to 400.
    #[error("{0}")]
    Validation(String),

    /// The agent runtime call failed. Pre-stream, maps to 500.
    #[error("Error invoking agent: {0}")]
    Invocation(String),

    /// Failure while draining or writing the response body.
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Invalid JSON in request: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// HTTP status carried by the error frame for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Invocation(_) | AppError::Relay(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("prompt is required in the request body".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Config("AGENT_RUNTIME_ARN environment variable not set".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Invocation("connection refused".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invocation_message_prefix() {
        let err = AppError::Invocation("timed out".into());
        assert_eq!(err.to_string(), "Error invoking agent: timed out");
    }

    #[test]
    fn test_json_error_maps_to_bad_request() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Invalid JSON in request:"));
    }
}
