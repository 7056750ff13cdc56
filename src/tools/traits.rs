use super::error::ToolError;
use crate::llm::ToolSchema;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// An in-process tool the model may invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within the catalog
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema for the tool's arguments
    fn parameters(&self) -> Value;

    async fn call(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError>;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Read a string argument, treating a missing or non-string value as empty
pub(crate) fn string_arg<'a>(arguments: &'a Map<String, Value>, key: &str) -> &'a str {
    arguments.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Schema for a tool taking a single string property
pub(crate) fn single_string_schema(property: &str, description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            property: {
                "type": "string",
                "description": description
            }
        },
        "required": [property]
    })
}

/// Schema for a tool taking no arguments
pub(crate) fn empty_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}
