use super::calculator::CalculatorTool;
use super::error::ToolError;
use super::system::{CurrentTimeTool, SystemInfoTool};
use super::text::{CountWordsTool, ReverseStringTool};
use super::traits::Tool;
use crate::llm::ToolSchema;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Immutable catalog of in-process tools
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<Vec<Arc<dyn Tool>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }

    /// Registry holding the built-in tools
    pub fn builtin() -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(CurrentTimeTool),
            Arc::new(CalculatorTool),
            Arc::new(SystemInfoTool),
            Arc::new(ReverseStringTool),
            Arc::new(CountWordsTool),
        ];
        Self::new(tools)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn list_tools(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Execute a tool by name
    #[tracing::instrument(name = "tools.execute", skip(self, arguments), fields(tool.name = %name))]
    pub async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        debug!(tool = %name, "Invoking tool");
        let started = Instant::now();
        let result = tool.call(arguments).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(_) => info!(tool = %name, latency_ms = elapsed_ms, "Tool executed"),
            Err(e) => warn!(tool = %name, error = %e, latency_ms = elapsed_ms, "Tool execution failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let registry = ToolRegistry::builtin();
        let tools = registry.list_tools();
        let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tools.len(), 5);
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_schemas_use_object_shape() {
        for tool in ToolRegistry::builtin().list_tools() {
            assert_eq!(tool.parameters["type"], "object", "{}", tool.name);
            assert!(tool.parameters["properties"].is_object());
            assert!(tool.parameters["required"].is_array());
        }
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let result = ToolRegistry::builtin().execute("unknown_tool", &Map::new()).await;
        assert_eq!(result, Err(ToolError::UnknownTool("unknown_tool".to_string())));
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let mut args = Map::new();
        args.insert("text".to_string(), Value::from("abc"));
        let result = ToolRegistry::builtin()
            .execute("reverse_string", &args)
            .await
            .unwrap();
        assert_eq!(result, Value::from("cba"));
    }
}
