//! Request and response types for the status endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response for GET /health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    /// A healthy response stamped with the current time.
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Response for command endpoints (reload, clear-cache, toggles, mappings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether the command was successful.
    pub success: bool,
    /// Message describing the result.
    pub message: String,
    /// Optional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    /// Create a success response.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

/// Body of PUT /api/knowledge/intelligent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// Body of POST /api/knowledge/mappings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingRequest {
    pub key: String,
    pub keywords: Vec<String>,
}

/// Body of POST /api/prompt.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptRequest {
    /// The user's chat message.
    pub message: String,
    /// Base prompt; the configured one is used when absent.
    #[serde(default)]
    pub base_prompt: Option<String>,
    /// Consult the remote selector.
    #[serde(default)]
    pub intelligent: bool,
}

/// Response for POST /api/prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResponse {
    /// The composed system prompt.
    pub prompt: String,
    /// Knowledge keys included, in prompt order.
    pub sources: Vec<String>,
}
