use super::error::ToolError;
use super::traits::{empty_schema, Tool};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &'static str {
        "get_current_time"
    }

    fn description(&self) -> &'static str {
        "Get the current date and time"
    }

    fn parameters(&self) -> Value {
        empty_schema()
    }

    async fn call(&self, _arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let now = chrono::Local::now();
        Ok(Value::String(now.format("%Y-%m-%d %H:%M:%S").to_string()))
    }
}

pub struct SystemInfoTool;

#[async_trait]
impl Tool for SystemInfoTool {
    fn name(&self) -> &'static str {
        "get_system_info"
    }

    fn description(&self) -> &'static str {
        "Get basic system information"
    }

    fn parameters(&self) -> Value {
        empty_schema()
    }

    async fn call(&self, _arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        Ok(json!({
            "platform": std::env::consts::OS,
            "platform_family": std::env::consts::FAMILY,
            "architecture": std::env::consts::ARCH,
            "service_version": env!("CARGO_PKG_VERSION"),
        }))
    }
}
