//! Request normalization
//!
//! Extracts a validated invocation request from a raw inbound envelope.
//! The envelope is either a plain JSON object, or a gateway-style
//! wrapper whose `body` field holds the JSON text, optionally
//! base64-encoded per the `isBase64Encoded` flag.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Default content type sent to the agent runtime
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
/// Default accept header sent to the agent runtime
pub const DEFAULT_ACCEPT: &str = "text/event-stream";

/// A validated, immutable invocation request.
///
/// Constructed once per request by [`InvocationRequest::from_envelope`]
/// and consumed once by the orchestrator.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    /// Prompt text, guaranteed non-empty
    pub prompt: String,
    /// Session identifier, generated as `session-<uuid>` when absent
    pub session_id: String,
    /// Content type of the upstream payload
    pub content_type: String,
    /// Accept header for the upstream call
    pub accept: String,
}

/// Recognized request fields; extra fields are ignored.
#[derive(Debug, Deserialize)]
struct RawInvocation {
    prompt: Option<String>,
    session_id: Option<String>,
    content_type: Option<String>,
    accept: Option<String>,
}

impl InvocationRequest {
    /// Normalize a raw inbound envelope into an invocation request.
    ///
    /// Parse failures and base64 decode failures map to 400-class
    /// errors; a missing or empty `prompt` is rejected.
    pub fn from_envelope(raw: &[u8]) -> AppResult<Self> {
        let value = unwrap_envelope(raw)?;
        let fields: RawInvocation = serde_json::from_value(value)?;

        let prompt = fields
            .prompt
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                AppError::Validation("prompt is required in the request body".to_string())
            })?;

        Ok(Self {
            prompt,
            session_id: fields
                .session_id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("session-{}", Uuid::new_v4())),
            content_type: fields
                .content_type
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            accept: fields
                .accept
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_ACCEPT.to_string()),
        })
    }

    /// Payload bytes forwarded to the agent runtime.
    pub fn payload(&self) -> Vec<u8> {
        json!({ "prompt": self.prompt }).to_string().into_bytes()
    }
}

/// Resolve the envelope shape to the inner request object.
fn unwrap_envelope(raw: &[u8]) -> AppResult<Value> {
    let value: Value = serde_json::from_slice(raw)?;
    let Some(object) = value.as_object() else {
        return Err(AppError::Validation(
            "request body must be a JSON object".to_string(),
        ));
    };

    let Some(body) = object.get("body") else {
        return Ok(value);
    };

    let encoded = body.as_str().unwrap_or_default();
    let is_base64 = object
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let text = if is_base64 && !encoded.is_empty() {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| AppError::Validation(format!("Invalid JSON in request: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Validation(format!("Invalid JSON in request: {e}")))?
    } else {
        encoded.to_string()
    };

    if text.is_empty() {
        return Ok(json!({}));
    }
    Ok(serde_json::from_str(&text)?)
}
