use crate::llm::{ChatMessage, ChatResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, alias = "use_mcp")]
    pub use_tools: bool,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model_label: String,
    pub finish_reason: String,
}

impl From<ChatResult> for ChatResponse {
    fn from(result: ChatResult) -> Self {
        Self {
            content: result.content,
            model_label: result.model_label,
            finish_reason: result.finish_reason,
        }
    }
}

/// Direct tool invocation request
#[derive(Debug, Deserialize)]
pub struct ExecuteToolRequest {
    pub tool: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Router state snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct RouterStatusResponse {
    pub credential_index: usize,
    pub primary_exhausted: bool,
    pub credential_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    pub fallback_configured: bool,
}

/// Service banner returned on `/`
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}
