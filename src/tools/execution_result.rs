use super::error::ToolError;
use crate::llm::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload fed back to the model for one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Success { result: Value },
    Failure { error: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<Result<Value, ToolError>> for ToolOutcome {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(result) => Self::Success { result },
            Err(err) => Self::Failure {
                error: err.to_string(),
            },
        }
    }
}

/// Result of executing the tool call identified by `tool_call_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn new(tool_call_id: impl Into<String>, outcome: ToolOutcome) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            outcome,
        }
    }

    /// Tool-role message answering the originating call
    pub fn to_message(&self) -> ChatMessage {
        let content = match &self.outcome {
            ToolOutcome::Success { result } => serde_json::json!({ "result": result }),
            ToolOutcome::Failure { error } => serde_json::json!({ "error": error }),
        };
        ChatMessage::tool(self.tool_call_id.clone(), content.to_string())
    }
}
